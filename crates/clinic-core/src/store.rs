use std::collections::BTreeMap;

/// Identifier minted by a [`RecordStore`] from its monotonic sequence.
pub trait RecordId: Copy + Ord {
    fn from_sequence(value: u64) -> Self;
}

/// In-memory keyed collection.
///
/// Identifiers come from a counter that only moves forward, so an id is never handed out twice
/// even after deletions. Keys are ordered, which makes iteration order equal to insertion order.
#[derive(Debug, Clone)]
pub struct RecordStore<K, V> {
    records: BTreeMap<K, V>,
    last_sequence: u64,
}

impl<K, V> Default for RecordStore<K, V> {
    fn default() -> Self {
        Self { records: BTreeMap::new(), last_sequence: 0 }
    }
}

impl<K: RecordId, V> RecordStore<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next id and store the value built for it.
    pub fn insert_with(&mut self, build: impl FnOnce(K) -> V) -> K {
        self.last_sequence += 1;
        let id = K::from_sequence(self.last_sequence);
        self.records.insert(id, build(id));
        id
    }

    #[must_use]
    pub fn get(&self, id: K) -> Option<&V> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: K) -> Option<&mut V> {
        self.records.get_mut(&id)
    }

    #[must_use]
    pub fn contains(&self, id: K) -> bool {
        self.records.contains_key(&id)
    }

    pub fn remove(&mut self, id: K) -> Option<V> {
        self.records.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.records.iter().map(|(id, value)| (*id, value))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.records.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PatientId;

    // Test IDs: TSTO-001
    #[test]
    fn ids_start_at_one_and_are_not_reused_after_delete() {
        let mut store: RecordStore<PatientId, &str> = RecordStore::new();
        let first = store.insert_with(|_| "first");
        let second = store.insert_with(|_| "second");
        assert_eq!(first, PatientId(1));
        assert_eq!(second, PatientId(2));

        assert_eq!(store.remove(first), Some("first"));
        let third = store.insert_with(|_| "third");

        assert_eq!(third, PatientId(3));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(second), Some(&"second"));
    }

    // Test IDs: TSTO-002
    #[test]
    fn iteration_follows_insertion_order() {
        let mut store: RecordStore<PatientId, String> = RecordStore::new();
        for name in ["a", "b", "c"] {
            store.insert_with(|id| format!("{name}{id}"));
        }
        let _ = store.remove(PatientId(2));

        let values = store.values().cloned().collect::<Vec<_>>();
        assert_eq!(values, vec!["a1".to_string(), "c3".to_string()]);
    }

    // Test IDs: TSTO-003
    #[test]
    fn missing_ids_are_reported_as_absent() {
        let mut store: RecordStore<PatientId, u8> = RecordStore::new();
        assert!(store.is_empty());
        assert!(store.get(PatientId(1)).is_none());
        assert!(store.get_mut(PatientId(1)).is_none());
        assert!(store.remove(PatientId(1)).is_none());
        assert!(!store.contains(PatientId(1)));
    }
}
