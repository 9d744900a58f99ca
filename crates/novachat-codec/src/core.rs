//! Frame-shape logic shared by L0 and L1: header layout, salt, CRC-over-
//! plaintext, and the encrypt/decrypt seam. L0 and L1 differ only in whether
//! a length prefix precedes this shared shape; see `l0.rs`/`l1.rs`.

use novachat_protocol::{Cipher, FrameError, Id128, CRC_SIZE, SALT_SIZE};

use crate::crc::fnv1a;

/// `flags(1) + origin(16) + destination(16)`.
pub(crate) const HEADER_LEN: usize = 1 + 16 + 16;

/// Smallest possible `header || body || crc` for an empty payload.
pub(crate) const MIN_BODY_LEN: usize = HEADER_LEN + SALT_SIZE + CRC_SIZE;

pub(crate) struct Decoded {
    pub flags: u8,
    pub origin: Id128,
    pub destination: Id128,
    pub payload: Vec<u8>,
}

fn header_bytes(flags: u8, origin: Id128, destination: Id128) -> [u8; HEADER_LEN] {
    let mut buf = [0u8; HEADER_LEN];
    buf[0] = flags;
    buf[1..17].copy_from_slice(&origin.to_bytes());
    buf[17..33].copy_from_slice(&destination.to_bytes());
    buf
}

/// Build `header || body || crc`, where `body` is `plaintext || salt`,
/// optionally encrypted.
pub(crate) fn build(
    flags: u8,
    origin: Id128,
    destination: Id128,
    plaintext: &[u8],
    encrypted: bool,
    cipher: Option<&dyn Cipher>,
) -> Result<Vec<u8>, FrameError> {
    if encrypted != cipher.is_some() {
        return Err(FrameError::EncryptionRequired);
    }

    let header = header_bytes(flags, origin, destination);

    let mut salt = [0u8; SALT_SIZE];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut salt);

    let mut plaintext_plus_salt = Vec::with_capacity(plaintext.len() + SALT_SIZE);
    plaintext_plus_salt.extend_from_slice(plaintext);
    plaintext_plus_salt.extend_from_slice(&salt);

    let crc = fnv1a(&[&header, &plaintext_plus_salt]);

    let body = match cipher {
        Some(cipher) => cipher
            .encrypt(&plaintext_plus_salt)
            .map_err(|e| FrameError::EncryptionFailed(e.to_string()))?,
        None => plaintext_plus_salt,
    };

    let mut out = Vec::with_capacity(HEADER_LEN + body.len() + CRC_SIZE);
    out.extend_from_slice(&header);
    out.extend_from_slice(&body);
    out.extend_from_slice(&crc.to_le_bytes());
    Ok(out)
}

/// Parse `header || body || crc` (the part of the frame after any length
/// prefix), returning the plaintext payload with its trailing salt removed.
///
/// `encrypted_bit` is the layer's own `ENCRYPTED` bit value (L0 and L1 use
/// different bit positions), used to read encrypted-ness directly off the
/// raw flags byte before a `Flags` type is reconstructed by the caller.
pub(crate) fn parse(
    bytes: &[u8],
    encrypted_bit: u8,
    cipher: Option<&dyn Cipher>,
) -> Result<Decoded, FrameError> {
    if bytes.len() < MIN_BODY_LEN {
        return Err(FrameError::TooShort {
            len: bytes.len(),
            min: MIN_BODY_LEN,
        });
    }

    let flags = bytes[0];
    let origin = Id128::from_bytes(bytes[1..17].try_into().unwrap());
    let destination = Id128::from_bytes(bytes[17..33].try_into().unwrap());
    let encrypted = flags & encrypted_bit != 0;

    if encrypted && cipher.is_none() {
        return Err(FrameError::DecryptRequired);
    }

    let header = &bytes[..HEADER_LEN];
    let body_and_crc = &bytes[HEADER_LEN..];
    let (body, crc_bytes) = body_and_crc.split_at(body_and_crc.len() - CRC_SIZE);
    let trailing_crc = u32::from_le_bytes(crc_bytes.try_into().unwrap());

    let decoded = if encrypted {
        cipher
            .expect("checked above")
            .decrypt(body)
            .map_err(|e| FrameError::DecryptFailed(e.to_string()))?
    } else {
        body.to_vec()
    };

    let computed_crc = fnv1a(&[header, &decoded]);
    if computed_crc != trailing_crc {
        return Err(FrameError::CrcMismatch);
    }

    if decoded.len() < SALT_SIZE {
        return Err(FrameError::TooShort {
            len: decoded.len(),
            min: SALT_SIZE,
        });
    }
    let payload = decoded[..decoded.len() - SALT_SIZE].to_vec();

    Ok(Decoded {
        flags,
        origin,
        destination,
        payload,
    })
}
