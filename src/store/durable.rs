use std::path::Path;

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use serde_json::Value;
use tracing::{debug, info};

use super::RecordStore;
use super::error::{Result, StoreError};
use super::keys::{decode_record_key, encode_collection_prefix, encode_record_key};

/// Fjall-backed record store. Every collection shares the `records`
/// partition, separated by key prefix.
#[derive(Clone)]
pub struct FjallStore {
    keyspace: Keyspace,
    records: PartitionHandle,
}

impl FjallStore {
    /// Open or create a Fjall store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening Fjall store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let records = keyspace.open_partition("records", PartitionCreateOptions::default())?;

        Ok(Self { keyspace, records })
    }

    /// Persist all pending writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }

    /// Number of records in a collection
    pub fn count(&self, collection: &str) -> Result<usize> {
        let mut count = 0;
        for item in self.records.prefix(encode_collection_prefix(collection)) {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

impl RecordStore for FjallStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        match self.records.get(encode_record_key(collection, id))? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn put(&self, collection: &str, id: &str, record: &Value) -> Result<()> {
        let value = serde_json::to_vec(record)?;
        self.records.insert(encode_record_key(collection, id), value)?;
        debug!(collection, id, "Stored record");
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let key = encode_record_key(collection, id);
        if !self.records.contains_key(&key)? {
            return Ok(false);
        }
        self.records.remove(key)?;
        debug!(collection, id, "Deleted record");
        Ok(true)
    }

    fn list(&self, collection: &str) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        for item in self.records.prefix(encode_collection_prefix(collection)) {
            let (key, value) = item?;
            decode_record_key(&key)
                .ok_or_else(|| StoreError::InvalidKey(String::from_utf8_lossy(&key).into_owned()))?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "fjall"
    }
}
