use std::sync::Arc;

use novachat_protocol::{Cipher, Id128};
use parking_lot::RwLock;

/// `{id, transport, nickname?, cipher?}`. Created on accept with a fresh
/// random id; the cipher is installed after a successful handshake; the
/// nickname is installed after welcome-accept.
pub struct ClientRecord<T> {
    pub id: Id128,
    pub transport: T,
    nickname: RwLock<Option<String>>,
    cipher: RwLock<Option<Arc<dyn Cipher>>>,
}

impl<T> ClientRecord<T> {
    pub fn new(id: Id128, transport: T) -> Self {
        ClientRecord {
            id,
            transport,
            nickname: RwLock::new(None),
            cipher: RwLock::new(None),
        }
    }

    pub fn nickname(&self) -> Option<String> {
        self.nickname.read().clone()
    }

    pub fn set_nickname(&self, nickname: String) {
        *self.nickname.write() = Some(nickname);
    }

    pub fn cipher(&self) -> Option<Arc<dyn Cipher>> {
        self.cipher.read().clone()
    }

    pub fn set_cipher(&self, cipher: Arc<dyn Cipher>) {
        *self.cipher.write() = Some(cipher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_start_unset() {
        let record = ClientRecord::new(Id128::random(), ());
        assert_eq!(record.nickname(), None);
        assert!(record.cipher().is_none());
    }

    #[test]
    fn nickname_and_cipher_are_settable_after_construction() {
        let record = ClientRecord::new(Id128::random(), ());
        record.set_nickname("alice".to_string());
        assert_eq!(record.nickname(), Some("alice".to_string()));
    }
}
