//! The relay step: look up the destination in the registry and re-encode L0
//! under its key. The L1 body is opaque to the server and passes through
//! unmodified.

use novachat_codec::L0Frame;
use novachat_protocol::{Id128, L0Flags};
use novachat_registry::Registry;
use novachat_transport::Transport;

pub async fn forward<T: Transport>(registry: &Registry<T>, origin: Id128, destination: Id128, l1_bytes: Vec<u8>) {
    let Some(target) = registry.get(destination) else {
        tracing::debug!(%destination, "relay target not found");
        return;
    };

    let Some(cipher) = target.cipher() else {
        tracing::debug!(%destination, "relay target has no installed key yet");
        return;
    };

    let frame = L0Frame::new(L0Flags::ENCRYPTED, origin, destination, l1_bytes);
    let bytes = match frame.build(Some(cipher.as_ref())) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(%destination, error = %e, "failed to re-encode relay frame");
            return;
        }
    };

    if let Err(e) = target.transport.write_frame(bytes).await {
        tracing::warn!(%destination, error = %e, "failed to write relay frame");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use novachat_registry::ClientRecord;
    use novachat_transport::FramedTransport;
    use std::sync::Arc;

    #[tokio::test]
    async fn forward_re_encrypts_under_destination_key() {
        use novachat_crypto::SymmetricKey;

        let registry: Registry<FramedTransport<tokio::io::DuplexStream>> = Registry::new();
        let (server_side, client_side) = FramedTransport::pair();

        let dest_id = Id128::random();
        let origin_id = Id128::random();
        let record = Arc::new(ClientRecord::new(dest_id, server_side));
        record.set_cipher(Arc::new(SymmetricKey::new([9u8; 32])));
        registry.insert(record);

        forward(&registry, origin_id, dest_id, b"opaque e2e ciphertext".to_vec()).await;

        let bytes = client_side.read_frame().await.unwrap().unwrap();
        let cipher = SymmetricKey::new([9u8; 32]);
        let parsed = L0Frame::parse(&bytes, Some(&cipher)).unwrap();
        assert_eq!(parsed.origin, origin_id);
        assert_eq!(parsed.destination, dest_id);
        assert_eq!(parsed.payload, b"opaque e2e ciphertext");
    }

    #[tokio::test]
    async fn forward_to_unknown_destination_is_silently_dropped() {
        let registry: Registry<FramedTransport<tokio::io::DuplexStream>> = Registry::new();
        // no panic, no write target; just exercising the not-found path.
        forward(&registry, Id128::random(), Id128::random(), b"x".to_vec()).await;
    }
}
