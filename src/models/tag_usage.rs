use serde::{Deserialize, Serialize};

use super::LocationId;

/// How often one exact (trimmed) tag string occurs in a category.
///
/// Derived on demand by the usage aggregator; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUsage {
    tag: String,
    location_ids: Vec<LocationId>,
}

impl TagUsage {
    pub fn new(tag: impl Into<String>, location_ids: Vec<LocationId>) -> Self {
        Self {
            tag: tag.into(),
            location_ids,
        }
    }

    /// The tag string as displayed, trimmed but with its original casing.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Number of occurrences. A location listing the tag twice counts twice.
    pub fn count(&self) -> usize {
        self.location_ids.len()
    }

    /// Id of the location behind each occurrence, in scan order.
    pub fn location_ids(&self) -> &[LocationId] {
        &self.location_ids
    }

    pub(crate) fn push(&mut self, id: &LocationId) {
        self.location_ids.push(id.clone());
    }
}
