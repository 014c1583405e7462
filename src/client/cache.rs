//! In-memory GET response cache.
//!
//! Entries live until [`RequestCache::clear`] or an explicit invalidation;
//! there is no TTL. Mutating requests never touch the cache, so keeping it
//! coherent after a write is the caller's job.

use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use super::request::{QueryParams, RawResponse, encode_query};

#[derive(Debug, Default)]
pub struct RequestCache {
    entries: RwLock<HashMap<String, RawResponse>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic key: normalized path plus sorted query params
    pub fn key(path: &str, params: &QueryParams) -> String {
        let path = normalize_path(path);
        if params.is_empty() {
            path
        } else {
            format!("{}?{}", path, encode_query(params))
        }
    }

    pub fn get(&self, key: &str) -> Option<RawResponse> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    /// Insert or overwrite (last write wins)
    pub fn insert(&self, key: String, response: RawResponse) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, response);
    }

    pub fn remove(&self, key: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key).is_some()
    }

    /// Drop every entry whose path starts with `prefix` (query ignored).
    /// Returns the number of entries removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let prefix = normalize_path(prefix);
        let nested = format!("{}/", prefix.trim_end_matches('/'));
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|key, _| {
            let path = key.split('?').next().unwrap_or(key);
            !(path == prefix || path.starts_with(&nested))
        });
        let removed = before - entries.len();
        debug!(prefix = %prefix, removed, "Invalidated cache entries");
        removed
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
        debug!("Request cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Leading slash, no duplicate or trailing slashes
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}
