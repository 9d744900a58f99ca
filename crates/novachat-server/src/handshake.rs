//! Component B: DH key generation, shared-secret derivation, challenge
//! verification. Server-initiated, up to 3 attempts, fresh key pair and
//! challenge each attempt.

use novachat_codec::{L0Frame, L1Frame};
use novachat_crypto::{base62, dh, SymmetricKey};
use novachat_protocol::{
    message::{self, DhPubClient, DhPubServer, MSG_DH_PUB},
    Id128, L0Flags, L1Flags,
};
use novachat_transport::Transport;

use crate::error::HandshakeError;

const MAX_ATTEMPTS: u32 = 3;

pub async fn perform_handshake<T: Transport>(transport: &T) -> Result<SymmetricKey, HandshakeError> {
    for attempt in 1..=MAX_ATTEMPTS {
        match try_once(transport).await {
            Ok(key) => return Ok(key),
            Err(e) => {
                tracing::warn!(attempt, error = %e, "handshake attempt failed");
            }
        }
    }
    Err(HandshakeError::Exhausted {
        attempts: MAX_ATTEMPTS,
    })
}

async fn try_once<T: Transport>(transport: &T) -> Result<SymmetricKey, HandshakeError> {
    let keypair = dh::generate_keypair();
    let challenge = dh::generate_challenge();

    let server_msg = DhPubServer {
        g: base62::encode(&dh::GENERATOR),
        p: base62::encode(&dh::PRIME),
        pub_key: base62::encode(&keypair.public),
        clng: challenge.clone(),
    };
    let l1 = L1Frame::new(
        L1Flags::JSON,
        Id128::NIL,
        Id128::NIL,
        message::encode_envelope(MSG_DH_PUB, &server_msg),
    );
    let l0 = L0Frame::new(L0Flags::empty(), Id128::NIL, Id128::NIL, l1.build(None)?);
    transport.write_frame(l0.build(None)?).await?;

    let Some(bytes) = transport.read_frame().await? else {
        return Err(HandshakeError::Transport(novachat_transport::TransportError::Closed));
    };
    let l0_reply = L0Frame::parse(&bytes, None)?;
    let l1_reply = L1Frame::parse(&l0_reply.payload, None)?;
    if !l1_reply.flags.contains(L1Flags::JSON) {
        return Err(HandshakeError::UnexpectedMessageType {
            expected: MSG_DH_PUB,
            got: "<non-json>".to_string(),
        });
    }
    let client_msg: DhPubClient = message::decode_envelope_data(&l1_reply.payload, MSG_DH_PUB)?;

    let peer_public = base62::decode(&client_msg.pub_key).map_err(|_| HandshakeError::UnexpectedMessageType {
        expected: MSG_DH_PUB,
        got: "<malformed public key>".to_string(),
    })?;
    let shared = dh::compute_shared_secret(&keypair.private, &peer_public);
    let expected_hash = dh::compute_challenge_hash(&challenge, &shared);

    if client_msg.hash != expected_hash {
        return Err(HandshakeError::UnexpectedMessageType {
            expected: MSG_DH_PUB,
            got: "<hash mismatch>".to_string(),
        });
    }

    Ok(SymmetricKey::new(shared))
}
