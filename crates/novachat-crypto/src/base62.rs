//! Base-62 big-integer text encoding, matching Go's `big.Int.Text(62)` /
//! `SetString(s, 62)` alphabet: digits, then lowercase, then uppercase.

use std::fmt;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Base62Error {
    pub bad_char: char,
}

impl fmt::Display for Base62Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid base62 character: {:?}", self.bad_char)
    }
}

impl std::error::Error for Base62Error {}

pub fn encode(n: &BigUint) -> String {
    if n.is_zero() {
        return "0".to_string();
    }
    let base = BigUint::from(62u32);
    let mut n = n.clone();
    let mut digits = Vec::new();
    while !n.is_zero() {
        let remainder = (&n % &base).to_u32().expect("remainder of mod 62 fits in u32");
        digits.push(ALPHABET[remainder as usize]);
        n /= &base;
    }
    digits.reverse();
    String::from_utf8(digits).expect("alphabet is ascii")
}

pub fn decode(s: &str) -> Result<BigUint, Base62Error> {
    let base = BigUint::from(62u32);
    let mut n = BigUint::zero();
    for c in s.chars() {
        let digit = ALPHABET
            .iter()
            .position(|&b| b == c as u8)
            .ok_or(Base62Error { bad_char: c })?;
        n = n * &base + BigUint::from(digit as u32);
    }
    Ok(n)
}
