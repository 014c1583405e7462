use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::RwLock;

use super::RecordStore;
use super::error::Result;

/// In-memory record store
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<(String, String), Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    fn put(&self, collection: &str, id: &str, record: &Value) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.insert((collection.to_string(), id.to_string()), record.clone());
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .remove(&(collection.to_string(), id.to_string()))
            .is_some())
    }

    fn list(&self, collection: &str) -> Result<Vec<Value>> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|(_, value)| value.clone())
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
