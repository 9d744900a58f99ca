use std::fmt;

#[derive(Debug)]
pub enum TransportError {
    /// The transport was already closed locally.
    Closed,
    /// The declared L0 `size` exceeds `MAX_FRAME`.
    FrameTooLarge { len: usize, max: usize },
    /// Underlying I/O error, including EOF encountered mid-frame.
    Io(std::io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Closed => write!(f, "transport is closed"),
            TransportError::FrameTooLarge { len, max } => {
                write!(f, "frame size {len} exceeds maximum {max}")
            }
            TransportError::Io(e) => write!(f, "transport i/o error: {e}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e)
    }
}
