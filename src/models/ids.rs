use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a location document.
///
/// Wraps the opaque document id assigned by the store so location ids
/// cannot be confused with tag strings or other free text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    /// Creates a new location ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying document id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for LocationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_id_serializes_as_raw_string() {
        let id = LocationId::new("cortina");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"cortina\"");

        let deserialized: LocationId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn display_prints_bare_id() {
        assert_eq!(LocationId::from("livigno").to_string(), "livigno");
    }
}
