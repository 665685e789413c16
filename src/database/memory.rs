use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{DocumentStore, KeyRange, PropertySet, StoreError};

/// In-process `DocumentStore`. Transactions snapshot the whole map and
/// restore it when the closure fails.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<BTreeMap<String, PropertySet>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, PropertySet>> {
        // A panic while holding the lock leaves the map itself intact.
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<PropertySet>, StoreError> {
        Ok(self.lock().get(id).cloned())
    }

    fn put(&self, id: &str, properties: PropertySet) -> Result<(), StoreError> {
        self.lock().insert(id.to_string(), properties);
        Ok(())
    }

    fn query(&self, range: &KeyRange) -> Result<Vec<(String, PropertySet)>, StoreError> {
        if range.start >= range.end {
            return Ok(Vec::new());
        }
        Ok(self
            .lock()
            .range(range.start.clone()..range.end.clone())
            .map(|(id, properties)| (id.clone(), properties.clone()))
            .collect())
    }

    fn transaction(
        &self,
        f: &mut dyn FnMut(&dyn DocumentStore) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let snapshot = self.lock().clone();
        let result = f(self);
        if result.is_err() {
            *self.lock() = snapshot;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: serde_json::Value) -> PropertySet {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_query_range_is_half_open() {
        let store = MemoryStore::new();
        for id in ["a", "b", "c"] {
            store.put(id, props(json!({}))).unwrap();
        }
        let range = KeyRange {
            start: "a".to_string(),
            end: "c".to_string(),
        };
        let ids: Vec<_> = store.query(&range).unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_failed_transaction_restores_snapshot() {
        let store = MemoryStore::new();
        store.put("kept", props(json!({"v": 1}))).unwrap();

        let result = store.transaction(&mut |tx| {
            tx.put("kept", props(json!({"v": 2})))?;
            tx.put("lost", props(json!({})))?;
            Err(StoreError::InvalidDocument {
                id: "lost".to_string(),
                reason: "forced".to_string(),
            })
        });

        assert!(result.is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("kept").unwrap(), Some(props(json!({"v": 1}))));
    }

    #[test]
    fn test_successful_transaction_keeps_writes() {
        let store = MemoryStore::new();
        store
            .transaction(&mut |tx| tx.put("doc", props(json!({"v": 1}))))
            .unwrap();
        assert!(store.get("doc").unwrap().is_some());
    }
}
