use serde::{Deserialize, Serialize};

use super::{Category, LocationId};

/// One normalized tag that occurs more than once on a single location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateInfo {
    /// The normalized (trimmed, lower-cased) tag.
    pub tag: String,
    /// Total occurrences across the scanned categories, always at least 2.
    pub count: usize,
    /// Category of each occurrence, in scan order. A category appears twice
    /// when its own list repeats the tag.
    pub categories: Vec<Category>,
}

/// Duplicate report for one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationAnalysis {
    pub id: LocationId,
    pub name: String,
    /// Non-empty tags scanned across all categories.
    pub total_tags: usize,
    pub duplicates: Vec<DuplicateInfo>,
}

impl LocationAnalysis {
    /// A location is clean when no normalized tag repeats.
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
    }
}
