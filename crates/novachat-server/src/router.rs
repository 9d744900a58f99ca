//! Component F: server API router. Dispatches control messages whose L0
//! destination is `NIL`. The inner L1 frame arrives unencrypted (it was
//! already riding inside an L0 frame encrypted under the client's key).

use novachat_codec::{L0Frame, L1Frame};
use novachat_protocol::{
    message::{self, ClientSummary, ListConnResponse, MSG_LIST_CONN},
    Cipher, Id128, L0Flags, L1Flags,
};
use novachat_registry::Registry;
use novachat_transport::Transport;

/// Handle one server API request. `caller` is the client id that sent it;
/// `caller_cipher` is its installed client↔server key, used to encrypt the
/// reply. `l1_bytes` is the still-unencrypted L1 frame bytes carried inside
/// the (already-decrypted) L0 payload.
pub async fn handle<T: Transport>(
    registry: &Registry<T>,
    caller: Id128,
    caller_cipher: &dyn Cipher,
    transport: &T,
    l1_bytes: &[u8],
) {
    let l1 = match L1Frame::parse(l1_bytes, None) {
        Ok(l1) => l1,
        Err(e) => {
            tracing::debug!(%caller, error = %e, "malformed server api frame");
            return;
        }
    };

    if !l1.flags.contains(L1Flags::JSON) {
        tracing::debug!(%caller, "non-json server api frame dropped");
        return;
    }

    let msg_type = match message::envelope_type(&l1.payload) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!(%caller, error = %e, "server api parse error");
            return;
        }
    };

    match msg_type.as_str() {
        MSG_LIST_CONN => {
            let clients = registry
                .snapshot()
                .into_iter()
                .map(|record| ClientSummary {
                    id: record.id,
                    nickname: record.nickname().unwrap_or_default(),
                })
                .collect();
            let reply = ListConnResponse { clients };
            let l1_reply = L1Frame::new(
                L1Flags::JSON,
                Id128::NIL,
                caller,
                message::encode_envelope(MSG_LIST_CONN, &reply),
            );
            let Ok(l1_bytes) = l1_reply.build(None) else {
                tracing::warn!(%caller, "failed to build server api reply l1 frame");
                return;
            };
            let l0_reply = L0Frame::new(L0Flags::ENCRYPTED, Id128::NIL, caller, l1_bytes);
            match l0_reply.build(Some(caller_cipher)) {
                Ok(bytes) => {
                    if let Err(e) = transport.write_frame(bytes).await {
                        tracing::warn!(%caller, error = %e, "failed to write server api reply");
                    }
                }
                Err(e) => tracing::warn!(%caller, error = %e, "failed to encrypt server api reply"),
            }
        }
        other => {
            tracing::debug!(%caller, msg_type = other, "unknown server api message type dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use novachat_crypto::SymmetricKey;
    use novachat_registry::ClientRecord;
    use novachat_transport::FramedTransport;
    use std::sync::Arc;

    #[tokio::test]
    async fn list_conn_replies_with_every_registered_client() {
        let registry: Registry<FramedTransport<tokio::io::DuplexStream>> = Registry::new();
        let (server_side, client_side) = FramedTransport::pair();

        let caller_id = Id128::random();
        let caller_key = SymmetricKey::new([7u8; 32]);
        let caller_record = Arc::new(ClientRecord::new(caller_id, server_side));
        caller_record.set_nickname("alice".to_string());
        caller_record.set_cipher(Arc::new(SymmetricKey::new([7u8; 32])));
        registry.insert(caller_record.clone());

        let other_record = Arc::new(ClientRecord::new(Id128::random(), ()));
        other_record.set_nickname("bob".to_string());
        registry.insert(other_record);

        let request = L1Frame::new(
            L1Flags::JSON,
            caller_id,
            Id128::NIL,
            message::encode_envelope(MSG_LIST_CONN, &serde_json::json!({})),
        )
        .build(None)
        .unwrap();

        handle(&registry, caller_id, &caller_key, &caller_record.transport, &request).await;

        let bytes = client_side.read_frame().await.unwrap().unwrap();
        let l0 = L0Frame::parse(&bytes, Some(&caller_key)).unwrap();
        assert_eq!(l0.destination, caller_id);
        let l1 = L1Frame::parse(&l0.payload, None).unwrap();
        let reply: ListConnResponse = message::decode_envelope_data(&l1.payload, MSG_LIST_CONN).unwrap();
        assert_eq!(reply.clients.len(), 2);
        assert!(reply.clients.iter().any(|c| c.id == caller_id && c.nickname == "alice"));
    }

    #[tokio::test]
    async fn unknown_message_type_is_silently_dropped() {
        let registry: Registry<FramedTransport<tokio::io::DuplexStream>> = Registry::new();
        let (server_side, client_side) = FramedTransport::pair();
        let caller_id = Id128::random();
        let caller_key = SymmetricKey::new([3u8; 32]);

        let request = L1Frame::new(
            L1Flags::JSON,
            caller_id,
            Id128::NIL,
            message::encode_envelope("not_a_real_type", &serde_json::json!({})),
        )
        .build(None)
        .unwrap();

        handle(&registry, caller_id, &caller_key, &server_side, &request).await;

        drop(server_side);
        assert!(client_side.read_frame().await.unwrap().is_none());
    }
}
