//! L0 transport envelope: `size:u32 | flags:u8 | origin:id128 | destination:id128 | body | crc:u32`.

use novachat_protocol::{Cipher, FrameError, Id128, L0Flags, MAX_FRAME};

use crate::core;

const SIZE_FIELD_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L0Frame {
    pub flags: L0Flags,
    pub origin: Id128,
    pub destination: Id128,
    pub payload: Vec<u8>,
}

impl L0Frame {
    pub fn new(flags: L0Flags, origin: Id128, destination: Id128, payload: Vec<u8>) -> Self {
        L0Frame {
            flags,
            origin,
            destination,
            payload,
        }
    }

    /// Encode this frame to wire bytes, including the leading length prefix.
    pub fn build(&self, cipher: Option<&dyn Cipher>) -> Result<Vec<u8>, FrameError> {
        let encrypted = self.flags.contains(L0Flags::ENCRYPTED);
        let body = core::build(
            self.flags.bits(),
            self.origin,
            self.destination,
            &self.payload,
            encrypted,
            cipher,
        )?;

        let total = SIZE_FIELD_LEN + body.len();
        if total > MAX_FRAME {
            return Err(FrameError::TooLarge {
                len: total,
                max: MAX_FRAME,
            });
        }

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Parse a full wire buffer, including its leading length prefix. The
    /// buffer must already be exactly one frame (the transport adapter is
    /// responsible for reassembly).
    pub fn parse(bytes: &[u8], cipher: Option<&dyn Cipher>) -> Result<Self, FrameError> {
        if bytes.len() < SIZE_FIELD_LEN {
            return Err(FrameError::TooShort {
                len: bytes.len(),
                min: SIZE_FIELD_LEN,
            });
        }
        let declared = u32::from_le_bytes(bytes[..SIZE_FIELD_LEN].try_into().unwrap()) as usize;
        if declared != bytes.len() {
            return Err(FrameError::SizeMismatch {
                declared,
                actual: bytes.len(),
            });
        }

        let decoded = core::parse(&bytes[SIZE_FIELD_LEN..], L0Flags::ENCRYPTED.bits(), cipher)?;
        Ok(L0Frame {
            flags: L0Flags::from_bits_truncate(decoded.flags),
            origin: decoded.origin,
            destination: decoded.destination,
            payload: decoded.payload,
        })
    }
}

/// Minimum valid on-wire length for an L0 frame with an empty payload.
pub const MIN_L0_LEN: usize = SIZE_FIELD_LEN + core::MIN_BODY_LEN;
