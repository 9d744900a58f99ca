//! The fixed 2048-bit MODP Diffie-Hellman group (RFC 3526), key pair
//! generation, shared-secret derivation, and the challenge-response proof of
//! possession used by the handshake engine.

use std::sync::LazyLock;

use num_bigint::BigUint;
use num_traits::Num;
use rand::{distributions::Alphanumeric, Rng, RngCore};
use sha2::{Digest, Sha256};

/// RFC 3526, 2048-bit MODP Group.
const PRIME_2048_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC7",
    "4020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F14",
    "374FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B",
    "7EDEE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A163",
    "BF0598DA48361C55D39A69163FA8FD24CF5F83655D23DCA3AD961C62F356208",
    "552BB9ED529077096966D670C354E4ABC9804F1746C08CA18217C32905E462E",
    "36CE3BE39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF69",
    "55817183995497CEA956AE515D2261898FA051015728E5A8AACAA68FFFFFFFF",
    "FFFFFFFF",
);

pub static PRIME: LazyLock<BigUint> =
    LazyLock::new(|| BigUint::from_str_radix(PRIME_2048_HEX, 16).expect("RFC 3526 prime parses"));

pub static GENERATOR: LazyLock<BigUint> = LazyLock::new(|| BigUint::from(2u32));

#[derive(Clone)]
pub struct KeyPair {
    pub private: BigUint,
    pub public: BigUint,
}

/// Draw uniformly from `[0, bound)` via rejection sampling on random bytes.
fn random_below(bound: &BigUint, rng: &mut impl RngCore) -> BigUint {
    let bits = bound.bits();
    let byte_len = bits.div_ceil(8) as usize;
    loop {
        let mut buf = vec![0u8; byte_len];
        rng.fill_bytes(&mut buf);
        let excess_bits = (byte_len as u64 * 8) - bits;
        if excess_bits > 0 {
            buf[0] &= 0xffu8 >> excess_bits;
        }
        let candidate = BigUint::from_bytes_be(&buf);
        if candidate < *bound {
            return candidate;
        }
    }
}

/// `private` uniform in `[0, P)`; `public = G^private mod P`.
///
/// The reference implementation this protocol was distilled from computed
/// `public = G^P mod P` (exponentiating by the prime instead of the private
/// key), which collapses every key pair onto the same public value. This is
/// the corrected form.
pub fn generate_keypair() -> KeyPair {
    let mut rng = rand::thread_rng();
    let private = random_below(&PRIME, &mut rng);
    let public = GENERATOR.modpow(&private, &PRIME);
    KeyPair { private, public }
}

/// `SHA-256((peer_public^private mod P).to_bytes())`.
pub fn compute_shared_secret(private: &BigUint, peer_public: &BigUint) -> [u8; 32] {
    let shared = peer_public.modpow(private, &PRIME);
    Sha256::digest(shared.to_bytes_be()).into()
}

/// `hex(SHA-256(challenge || shared))`.
pub fn compute_challenge_hash(challenge: &str, shared: &[u8; 32]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(challenge.as_bytes());
    hasher.update(shared);
    hex::encode(hasher.finalize())
}

/// A fresh random printable challenge string.
pub fn generate_challenge() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
