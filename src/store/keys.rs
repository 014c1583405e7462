//! Key layout shared by the record stores
//!
//! - `{collection}:{id}` -> record (JSON)
//!
//! Collection names never contain `:`; ids may.

pub const JOB_CARDS: &str = "job_cards";
pub const LEADS: &str = "leads";

/// Encode a record key: {collection}:{id}
pub fn encode_record_key(collection: &str, id: &str) -> Vec<u8> {
    format!("{}:{}", collection, id).into_bytes()
}

/// Encode a collection prefix for range scan: {collection}:
pub fn encode_collection_prefix(collection: &str) -> Vec<u8> {
    format!("{}:", collection).into_bytes()
}

/// Decode a record key: {collection}:{id} -> (collection, id)
pub fn decode_record_key(key: &[u8]) -> Option<(String, String)> {
    let key_str = std::str::from_utf8(key).ok()?;
    let (collection, id) = key_str.split_once(':')?;
    if collection.is_empty() || id.is_empty() {
        return None;
    }
    Some((collection.to_string(), id.to_string()))
}
