use std::fmt;

/// Frame codec error taxonomy (§7 of the design: kind, where, recovery policy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Declared or actual length is below the layer's minimum.
    TooShort { len: usize, min: usize },
    /// L0's declared `size` field does not equal the buffer length.
    SizeMismatch { declared: usize, actual: usize },
    /// `size` exceeds `MAX_FRAME`.
    TooLarge { len: usize, max: usize },
    /// `flags.ENCRYPTED` set but no transform supplied to build().
    EncryptionRequired,
    /// `flags.ENCRYPTED` set but no transform supplied to parse().
    DecryptRequired,
    /// The encrypt transform returned an error.
    EncryptionFailed(String),
    /// The decrypt transform returned an error.
    DecryptFailed(String),
    /// Recomputed CRC does not match the trailing CRC.
    CrcMismatch,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::TooShort { len, min } => {
                write!(f, "frame too short: {len} bytes, minimum {min}")
            }
            FrameError::SizeMismatch { declared, actual } => {
                write!(f, "declared size {declared} does not match buffer length {actual}")
            }
            FrameError::TooLarge { len, max } => {
                write!(f, "frame size {len} exceeds maximum {max}")
            }
            FrameError::EncryptionRequired => {
                write!(f, "flags.ENCRYPTED set but no encrypt transform supplied")
            }
            FrameError::DecryptRequired => {
                write!(f, "flags.ENCRYPTED set but no decrypt transform supplied")
            }
            FrameError::EncryptionFailed(msg) => write!(f, "encryption failed: {msg}"),
            FrameError::DecryptFailed(msg) => write!(f, "decryption failed: {msg}"),
            FrameError::CrcMismatch => write!(f, "crc mismatch"),
        }
    }
}

impl std::error::Error for FrameError {}

/// Error returned by a `Cipher` implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherError(pub String);

impl fmt::Display for CipherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CipherError {}
