//! Persistence behind the mock handlers
//!
//! Records are schemaless JSON documents grouped by collection. Two
//! implementations are provided:
//!
//! - [`MemoryStore`]: process-local, lost on exit
//! - [`FjallStore`]: embedded LSM keyspace, survives restarts
//!
//! ```rust,ignore
//! use workshop::store::{FjallStore, RecordStore};
//!
//! let store = FjallStore::open("data/mock")?;
//! store.put("job_cards", "jc-1", &json!({"id": "jc-1"}))?;
//! ```

mod durable;
pub mod error;
pub mod keys;
mod memory;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use durable::FjallStore;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;

pub trait RecordStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Insert or replace
    fn put(&self, collection: &str, id: &str, record: &Value) -> Result<()>;

    /// Returns whether a record was removed
    fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// All records of a collection, ordered by id
    fn list(&self, collection: &str) -> Result<Vec<Value>>;

    fn name(&self) -> &'static str;
}

impl dyn RecordStore + '_ {
    pub fn fetch<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>> {
        self.get(collection, id)?
            .map(serde_json::from_value)
            .transpose()
            .map_err(StoreError::from)
    }

    pub fn save<T: Serialize>(&self, collection: &str, id: &str, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.put(collection, id, &value)
    }

    pub fn fetch_all<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        self.list(collection)?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(StoreError::from))
            .collect()
    }
}
