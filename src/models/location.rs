use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Category, LocationId};

/// Display name used when a location document has no `name` field.
pub const UNNAMED_LOCATION: &str = "Senza Nome";

/// Per-category tag lists of one location.
///
/// Keys are raw category names so lists under names outside [`Category`]
/// survive a read-modify-write cycle. Lists keep their stored order and
/// casing; nothing here deduplicates or normalizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagMap(BTreeMap<String, Vec<String>>);

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tag map from a stored `tags` value.
    ///
    /// Non-array entries and non-string elements are ignored; the store does
    /// not enforce a shape on this field.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        let lists = object
            .iter()
            .filter_map(|(key, entry)| {
                let items = entry.as_array()?;
                let tags = items
                    .iter()
                    .filter_map(|item| item.as_str().map(String::from))
                    .collect();
                Some((key.clone(), tags))
            })
            .collect();

        Self(lists)
    }

    /// Returns the list for a category, empty if absent.
    pub fn get(&self, category: Category) -> &[String] {
        self.get_raw(category.as_str())
    }

    /// Returns the list stored under an arbitrary key, empty if absent.
    pub fn get_raw(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the map holds a list for this category.
    pub fn contains(&self, category: Category) -> bool {
        self.0.contains_key(category.as_str())
    }

    /// Replaces the list for a category.
    pub fn set(&mut self, category: Category, tags: Vec<String>) {
        self.0.insert(category.as_str().to_string(), tags);
    }

    /// Replaces the list stored under an arbitrary key.
    pub fn set_raw(&mut self, key: impl Into<String>, tags: Vec<String>) {
        self.0.insert(key.into(), tags);
    }

    /// Iterates over `(key, list)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[(Category, Vec<&str>); N]> for TagMap {
    fn from(entries: [(Category, Vec<&str>); N]) -> Self {
        let mut map = Self::new();
        for (category, tags) in entries {
            map.set(category, tags.into_iter().map(String::from).collect());
        }
        map
    }
}

/// A tourism destination as seen by the tag tooling.
///
/// Only the fields the tag logic reads are lifted out of the stored
/// document; everything else stays in the raw document held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    id: LocationId,
    name: String,
    tags: TagMap,
}

impl Location {
    pub fn new(id: impl Into<LocationId>, name: impl Into<String>, tags: TagMap) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tags,
        }
    }

    /// Reads a location out of a stored document body.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctag::{Category, Location};
    ///
    /// let body = serde_json::json!({
    ///     "name": "Cortina d'Ampezzo",
    ///     "tags": { "sport": ["Ski", "Snowboard"] }
    /// });
    /// let location = Location::from_document("cortina", &body);
    ///
    /// assert_eq!(location.name(), "Cortina d'Ampezzo");
    /// assert_eq!(location.tags().get(Category::Sport), ["Ski", "Snowboard"]);
    /// ```
    pub fn from_document(id: impl Into<LocationId>, body: &Value) -> Self {
        let name = body
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNNAMED_LOCATION);
        let tags = body.get("tags").map(TagMap::from_value).unwrap_or_default();

        Self::new(id, name, tags)
    }

    pub fn id(&self) -> &LocationId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &TagMap {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagMap {
        &mut self.tags
    }
}
