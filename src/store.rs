//! Document store primitives the tag tooling is written against.

use serde_json::{Map, Value};
use thiserror::Error;
use time::OffsetDateTime;

/// Collection holding the light location documents, including `tags`.
pub const LOCATIONS: &str = "locations";

/// Collection holding the heavy per-location detail documents.
pub const LOCATION_DETAILS: &str = "location_details";

/// Errors raised by a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Stored body could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Partial update addressed a document that does not exist
    #[error("Document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// Dotted field path was malformed
    #[error("Invalid field path: {0:?}")]
    InvalidPath(String),
}

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
    pub updated_at: OffsetDateTime,
}

/// The five primitives every tag operation is expressed in.
///
/// Each call is independent; nothing spans more than one document, so a
/// sequence of calls can stop halfway and leave earlier writes in place.
pub trait DocumentStore {
    /// Lists every document of a collection.
    fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Fetches one document, `None` if absent.
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Writes a whole document. With `merge`, object fields are merged
    /// recursively into an existing body instead of replacing it.
    fn set(&self, collection: &str, id: &str, body: Value, merge: bool) -> Result<(), StoreError>;

    /// Updates fields addressed by dotted paths such as `tags.sport`.
    ///
    /// Fails with [`StoreError::NotFound`] when the document is absent.
    fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Vec<(String, Value)>,
    ) -> Result<(), StoreError>;

    /// Deletes one document. Deleting an absent document succeeds.
    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Deletes several documents, returning how many existed.
    fn delete_many(&self, collection: &str, ids: &[String]) -> Result<usize, StoreError>;
}

/// Writes `value` at a dotted `path` inside `body`, creating or replacing
/// intermediate objects as needed.
pub fn set_path(body: &mut Value, path: &str, value: Value) -> Result<(), StoreError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;

    let mut cursor = body;
    for segment in parents {
        cursor = object_mut(cursor)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    object_mut(cursor).insert(last.to_string(), value);

    Ok(())
}

fn object_mut(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

/// Recursively merges `patch` into `base`. Objects merge key by key; any
/// other value in `patch` replaces the one in `base`.
pub fn merge_values(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}
