use std::collections::HashMap;
use std::sync::Arc;

use novachat_protocol::Id128;
use parking_lot::RwLock;

use crate::ClientRecord;

/// Concurrent mapping `id128 -> ClientRecord`, the server's only mutable
/// shared state. Reads take a shared lock; mutations take an exclusive
/// lock. A removal racing a concurrent lookup is permitted: the loser simply
/// observes the entry absent.
pub struct Registry<T> {
    clients: RwLock<HashMap<Id128, Arc<ClientRecord<T>>>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            clients: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: Arc<ClientRecord<T>>) {
        self.clients.write().insert(record.id, record);
    }

    pub fn remove(&self, id: Id128) -> Option<Arc<ClientRecord<T>>> {
        self.clients.write().remove(&id)
    }

    pub fn get(&self, id: Id128) -> Option<Arc<ClientRecord<T>>> {
        self.clients.read().get(&id).cloned()
    }

    /// A point-in-time copy of every currently registered record.
    pub fn snapshot(&self) -> Vec<Arc<ClientRecord<T>>> {
        self.clients.read().values().cloned().collect()
    }

    /// Visit every currently registered record under a single read lock.
    pub fn for_each(&self, mut f: impl FnMut(&Arc<ClientRecord<T>>)) {
        for record in self.clients.read().values() {
            f(record);
        }
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_remove_then_get_is_absent() {
        let registry: Registry<()> = Registry::new();
        let id = Id128::random();
        registry.insert(Arc::new(ClientRecord::new(id, ())));
        assert!(registry.get(id).is_some());
        registry.remove(id);
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn snapshot_length_matches_inserted_count() {
        let registry: Registry<()> = Registry::new();
        for _ in 0..5 {
            registry.insert(Arc::new(ClientRecord::new(Id128::random(), ())));
        }
        assert_eq!(registry.snapshot().len(), 5);
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn remove_of_unknown_id_is_a_no_op() {
        let registry: Registry<()> = Registry::new();
        assert!(registry.remove(Id128::random()).is_none());
    }

    #[test]
    fn for_each_visits_every_record() {
        let registry: Registry<()> = Registry::new();
        let ids: Vec<Id128> = (0..3).map(|_| Id128::random()).collect();
        for id in &ids {
            registry.insert(Arc::new(ClientRecord::new(*id, ())));
        }
        let mut seen = Vec::new();
        registry.for_each(|record| seen.push(record.id));
        seen.sort();
        let mut expected = ids;
        expected.sort();
        assert_eq!(seen, expected);
    }
}
