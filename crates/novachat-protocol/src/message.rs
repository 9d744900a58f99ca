//! JSON control envelope and the reserved message DTOs (§6: `{type, data}`).

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::Id128;

pub const MSG_DH_PUB: &str = "dh_pub";
pub const MSG_WELCOME_INVITE: &str = "srv_welcome_invite";
pub const MSG_WELCOME_ACCEPT: &str = "srv_welcome_accept";
pub const MSG_NEW_CONNECTION: &str = "srv_new_conn";
pub const MSG_CONNECTION_LOST: &str = "srv_conn_lost";
pub const MSG_LIST_CONN: &str = "srv_conn_list";

/// `{ "type": "<msg_type>", "data": <any> }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: T,
}

/// Error decoding a JSON control envelope.
#[derive(Debug)]
pub enum EnvelopeError {
    Json(serde_json::Error),
    UnexpectedType { expected: &'static str, got: String },
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeError::Json(e) => write!(f, "malformed json envelope: {e}"),
            EnvelopeError::UnexpectedType { expected, got } => {
                write!(f, "expected message type {expected}, got {got}")
            }
        }
    }
}

impl std::error::Error for EnvelopeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EnvelopeError::Json(e) => Some(e),
            EnvelopeError::UnexpectedType { .. } => None,
        }
    }
}

/// Peek at `type` without committing to a `data` shape.
pub fn envelope_type(bytes: &[u8]) -> Result<String, EnvelopeError> {
    #[derive(Deserialize)]
    struct Peek {
        #[serde(rename = "type")]
        kind: String,
    }
    let peek: Peek = serde_json::from_slice(bytes).map_err(EnvelopeError::Json)?;
    Ok(peek.kind)
}

pub fn encode_envelope<T: Serialize>(kind: &str, data: &T) -> Vec<u8> {
    serde_json::to_vec(&Envelope {
        kind: kind.to_string(),
        data,
    })
    .expect("envelope serialization is infallible for well-formed DTOs")
}

/// Decode `data`, asserting `type` equals `expected`.
pub fn decode_envelope_data<T: DeserializeOwned>(
    bytes: &[u8],
    expected: &'static str,
) -> Result<T, EnvelopeError> {
    let envelope: Envelope<T> = serde_json::from_slice(bytes).map_err(EnvelopeError::Json)?;
    if envelope.kind != expected {
        return Err(EnvelopeError::UnexpectedType {
            expected,
            got: envelope.kind,
        });
    }
    Ok(envelope.data)
}

/// Server → client DH public value and challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DhPubServer {
    pub g: String,
    pub p: String,
    #[serde(rename = "pub")]
    pub pub_key: String,
    pub clng: String,
}

/// Client → server DH public value and proof-of-possession hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DhPubClient {
    #[serde(rename = "pub")]
    pub pub_key: String,
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeInvite {
    pub user_id: Id128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeAccept {
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSummary {
    pub id: Id128,
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConnResponse {
    pub clients: Vec<ClientSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewConnectionMsg {
    pub id: Id128,
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionLostMsg {
    pub id: Id128,
    pub nickname: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_type_peek() {
        let bytes = encode_envelope(MSG_LIST_CONN, &ListConnResponse { clients: vec![] });
        assert_eq!(envelope_type(&bytes).unwrap(), MSG_LIST_CONN);
    }

    #[test]
    fn decode_rejects_wrong_type() {
        let bytes = encode_envelope(MSG_LIST_CONN, &ListConnResponse { clients: vec![] });
        let result: Result<ListConnResponse, _> = decode_envelope_data(&bytes, MSG_NEW_CONNECTION);
        assert!(matches!(result, Err(EnvelopeError::UnexpectedType { .. })));
    }

    #[test]
    fn decode_round_trips() {
        let id = Id128::random();
        let bytes = encode_envelope(MSG_WELCOME_INVITE, &WelcomeInvite { user_id: id });
        let decoded: WelcomeInvite = decode_envelope_data(&bytes, MSG_WELCOME_INVITE).unwrap();
        assert_eq!(decoded.user_id, id);
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        let result = envelope_type(b"not json");
        assert!(matches!(result, Err(EnvelopeError::Json(_))));
    }
}
