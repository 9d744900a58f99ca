//! Generic length-prefixed framed transport over any `AsyncRead + AsyncWrite`
//! stream: framed read / chunked write per the transport adapter contract.
//! Used directly for tests over `tokio::io::duplex`; a real deployment would
//! wrap a `TcpStream`, but the production path here is the websocket
//! backend in `websocket.rs`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use novachat_protocol::MAX_FRAME;
use tokio::io::{split, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex as AsyncMutex;

use crate::TransportError;

const SIZE_FIELD_LEN: usize = 4;

pub struct FramedTransport<S> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    reader: AsyncMutex<ReadHalf<S>>,
    writer: AsyncMutex<WriteHalf<S>>,
    closed: AtomicBool,
}

impl<S> Clone for FramedTransport<S> {
    fn clone(&self) -> Self {
        FramedTransport {
            inner: self.inner.clone(),
        }
    }
}

impl<S> FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    pub fn new(stream: S) -> Self {
        let (reader, writer) = split(stream);
        FramedTransport {
            inner: Arc::new(Inner {
                reader: AsyncMutex::new(reader),
                writer: AsyncMutex::new(writer),
                closed: AtomicBool::new(false),
            }),
        }
    }
}

impl FramedTransport<tokio::io::DuplexStream> {
    /// A connected pair of in-memory transports, for tests.
    pub fn pair() -> (Self, Self) {
        let (a, b) = tokio::io::duplex(64 * 1024);
        (FramedTransport::new(a), FramedTransport::new(b))
    }
}

/// Reads exactly 4 bytes, unless the stream is at a clean boundary (zero
/// bytes available before any were read), in which case returns `None`.
async fn read_length_prefix<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<Option<[u8; SIZE_FIELD_LEN]>> {
    let mut buf = [0u8; SIZE_FIELD_LEN];
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "eof mid frame (inside length prefix)",
            ));
        }
        filled += n;
    }
    Ok(Some(buf))
}

impl<S> crate::Transport for FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    async fn read_frame(&self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }

        let mut reader = self.inner.reader.lock().await;
        let Some(size_bytes) = read_length_prefix(&mut *reader).await? else {
            return Ok(None);
        };
        let declared = u32::from_le_bytes(size_bytes) as usize;
        if declared > MAX_FRAME {
            return Err(TransportError::FrameTooLarge {
                len: declared,
                max: MAX_FRAME,
            });
        }
        if declared < SIZE_FIELD_LEN {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "declared frame size shorter than its own length prefix",
            )));
        }

        let mut buf = vec![0u8; declared];
        buf[..SIZE_FIELD_LEN].copy_from_slice(&size_bytes);
        reader.read_exact(&mut buf[SIZE_FIELD_LEN..]).await?;
        Ok(Some(buf))
    }

    async fn write_frame(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }

        let mut writer = self.inner.writer.lock().await;
        let mut offset = 0;
        while offset < bytes.len() {
            let n = writer.write(&bytes[offset..]).await?;
            if n == 0 {
                return Err(TransportError::Closed);
            }
            offset += n;
            if offset < bytes.len() {
                tokio::task::yield_now().await;
            }
        }
        writer.flush().await?;
        Ok(())
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transport as _;

    #[tokio::test]
    async fn write_then_read_round_trips_a_frame() {
        let (a, b) = FramedTransport::pair();
        let frame = {
            let mut bytes = vec![0u8; 10];
            bytes[..4].copy_from_slice(&10u32.to_le_bytes());
            bytes
        };
        a.write_frame(frame.clone()).await.unwrap();
        let got = b.read_frame().await.unwrap().unwrap();
        assert_eq!(got, frame);
    }

    #[tokio::test]
    async fn clean_close_reads_as_none() {
        let (a, b) = FramedTransport::pair();
        drop(a);
        assert_eq!(b.read_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn oversized_declared_length_is_rejected() {
        let (a, b) = FramedTransport::pair();
        let bytes = (MAX_FRAME as u32 + 1).to_le_bytes().to_vec();
        // write only the length prefix; the declared size check happens
        // before any attempt to read a body that large.
        use tokio::io::AsyncWriteExt;
        {
            let mut inner = a.inner.writer.lock().await;
            inner.write_all(&bytes).await.unwrap();
        }
        assert!(matches!(
            b.read_frame().await,
            Err(TransportError::FrameTooLarge { .. })
        ));
    }
}
