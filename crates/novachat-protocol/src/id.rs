use std::fmt;

use serde::{Deserialize, Serialize};

/// 128-bit opaque identifier. Little-endian raw bytes on the wire, hyphenated
/// text form (UUID-shaped) in JSON.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Id128([u8; 16]);

impl Id128 {
    /// "The server", as a destination or as the origin of a server-emitted frame.
    pub const NIL: Id128 = Id128([0u8; 16]);

    /// "All connected clients", as a destination.
    pub const BROADCAST: Id128 = Id128([0xffu8; 16]);

    pub fn random() -> Self {
        let mut bytes = [0u8; 16];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Id128(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Id128(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    pub const fn is_nil(self) -> bool {
        self.0 == Self::NIL.0
    }

    pub const fn is_broadcast(self) -> bool {
        self.0 == Self::BROADCAST.0
    }
}

impl fmt::Display for Id128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7], b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]
        )
    }
}

impl fmt::Debug for Id128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id128({self})")
    }
}

impl From<Id128> for String {
    fn from(id: Id128) -> String {
        id.to_string()
    }
}

/// Error parsing a hyphenated 128-bit id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseId128Error;

impl fmt::Display for ParseId128Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed id128 text")
    }
}

impl std::error::Error for ParseId128Error {}

impl std::str::FromStr for Id128 {
    type Err = ParseId128Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: String = s.chars().filter(|c| *c != '-').collect();
        if hex.len() != 32 {
            return Err(ParseId128Error);
        }
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let s = &hex[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(s, 16).map_err(|_| ParseId128Error)?;
        }
        Ok(Id128(bytes))
    }
}

impl TryFrom<String> for Id128 {
    type Error = ParseId128Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_and_broadcast_are_distinct() {
        assert_ne!(Id128::NIL, Id128::BROADCAST);
        assert!(Id128::NIL.is_nil());
        assert!(Id128::BROADCAST.is_broadcast());
    }

    #[test]
    fn display_roundtrips_through_parse() {
        let id = Id128::random();
        let text = id.to_string();
        let parsed: Id128 = text.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn json_roundtrip() {
        let id = Id128::random();
        let json = serde_json::to_string(&id).unwrap();
        let back: Id128 = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn rejects_malformed_text() {
        assert_eq!("not-an-id".parse::<Id128>(), Err(ParseId128Error));
    }
}
