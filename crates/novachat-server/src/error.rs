use std::fmt;

use novachat_protocol::{message::EnvelopeError, FrameError};
use novachat_transport::TransportError;

/// `HANDSHAKE_FAILED`: the handshake exhausted its retry budget, or the
/// transport failed while attempting it.
#[derive(Debug)]
pub enum HandshakeError {
    Transport(TransportError),
    Frame(FrameError),
    Envelope(EnvelopeError),
    UnexpectedMessageType { expected: &'static str, got: String },
    Exhausted { attempts: u32 },
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::Transport(e) => write!(f, "transport error during handshake: {e}"),
            HandshakeError::Frame(e) => write!(f, "frame error during handshake: {e}"),
            HandshakeError::Envelope(e) => write!(f, "malformed handshake message: {e}"),
            HandshakeError::UnexpectedMessageType { expected, got } => {
                write!(f, "expected handshake message {expected}, got {got}")
            }
            HandshakeError::Exhausted { attempts } => {
                write!(f, "handshake failed after {attempts} attempts")
            }
        }
    }
}

impl std::error::Error for HandshakeError {}

impl From<TransportError> for HandshakeError {
    fn from(e: TransportError) -> Self {
        HandshakeError::Transport(e)
    }
}

impl From<FrameError> for HandshakeError {
    fn from(e: FrameError) -> Self {
        HandshakeError::Frame(e)
    }
}

impl From<EnvelopeError> for HandshakeError {
    fn from(e: EnvelopeError) -> Self {
        HandshakeError::Envelope(e)
    }
}

/// Errors that can end a connection's lifecycle before it reaches the
/// routing loop. Once in the routing loop, frame-level errors are handled
/// per the taxonomy (§7) and do not produce this type.
#[derive(Debug)]
pub enum ConnectionError {
    Handshake(HandshakeError),
    Transport(TransportError),
    WelcomeFrame(FrameError),
    WelcomeEnvelope(EnvelopeError),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::Handshake(e) => write!(f, "{e}"),
            ConnectionError::Transport(e) => write!(f, "transport error: {e}"),
            ConnectionError::WelcomeFrame(e) => write!(f, "frame error during welcome exchange: {e}"),
            ConnectionError::WelcomeEnvelope(e) => write!(f, "malformed welcome message: {e}"),
        }
    }
}

impl std::error::Error for ConnectionError {}

impl From<HandshakeError> for ConnectionError {
    fn from(e: HandshakeError) -> Self {
        ConnectionError::Handshake(e)
    }
}

impl From<TransportError> for ConnectionError {
    fn from(e: TransportError) -> Self {
        ConnectionError::Transport(e)
    }
}
