use crate::TransportError;

/// A bidirectional ordered byte stream that speaks whole L0 frames.
///
/// `read_frame` returns `Ok(None)` on a clean EOF (no partial frame
/// in flight); any other exit from a partially-read frame is an error.
/// Implementations must serialize concurrent writers onto the same
/// connection, since the relay forwarder and the connection's own task may
/// both write to it.
pub trait Transport: Send + Sync + 'static {
    async fn read_frame(&self) -> Result<Option<Vec<u8>>, TransportError>;
    async fn write_frame(&self, bytes: Vec<u8>) -> Result<(), TransportError>;
    fn close(&self);
    fn is_closed(&self) -> bool;
}
