//! L1 application envelope: same shape as L0 without a length prefix, since
//! it rides inside L0's plaintext.

use novachat_protocol::{Cipher, FrameError, Id128, L1Flags};

use crate::core;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L1Frame {
    pub flags: L1Flags,
    pub origin: Id128,
    pub destination: Id128,
    pub payload: Vec<u8>,
}

impl L1Frame {
    pub fn new(flags: L1Flags, origin: Id128, destination: Id128, payload: Vec<u8>) -> Self {
        L1Frame {
            flags,
            origin,
            destination,
            payload,
        }
    }

    pub fn build(&self, cipher: Option<&dyn Cipher>) -> Result<Vec<u8>, FrameError> {
        let encrypted = self.flags.contains(L1Flags::ENCRYPTED);
        core::build(
            self.flags.bits(),
            self.origin,
            self.destination,
            &self.payload,
            encrypted,
            cipher,
        )
    }

    pub fn parse(bytes: &[u8], cipher: Option<&dyn Cipher>) -> Result<Self, FrameError> {
        let decoded = core::parse(bytes, L1Flags::ENCRYPTED.bits(), cipher)?;
        Ok(L1Frame {
            flags: L1Flags::from_bits_truncate(decoded.flags),
            origin: decoded.origin,
            destination: decoded.destination,
            payload: decoded.payload,
        })
    }
}

/// Minimum valid on-wire length for an L1 frame with an empty payload.
pub const MIN_L1_LEN: usize = core::MIN_BODY_LEN;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_then_parse_round_trips() {
        let frame = L1Frame::new(L1Flags::JSON, Id128::random(), Id128::random(), b"{}".to_vec());
        let bytes = frame.build(None).unwrap();
        let parsed = L1Frame::parse(&bytes, None).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn no_length_prefix_unlike_l0() {
        let frame = L1Frame::new(L1Flags::empty(), Id128::NIL, Id128::NIL, vec![]);
        let bytes = frame.build(None).unwrap();
        assert_eq!(bytes.len(), MIN_L1_LEN);
    }
}
