//! Priority-ordered removal of repeated tags on one location.

use std::collections::HashSet;

use super::TagNormalizer;
use crate::models::{Category, TagMap};

/// Keeps each normalized tag only in the highest-priority category that
/// holds it.
///
/// Categories are visited in `priority` order; within a list the first
/// occurrence wins, so repeats inside one list are dropped as well. Blank
/// entries are dropped. Lists under keys not named in `priority` are
/// returned untouched. Applying the function to its own output changes
/// nothing.
///
/// # Examples
///
/// ```
/// use loctag::{Category, TagMap};
/// use loctag::tags::auto_cleanup;
///
/// let tags = TagMap::from([
///     (Category::Vibe, vec!["Relax"]),
///     (Category::Highlights, vec!["relax"]),
/// ]);
/// let cleaned = auto_cleanup(&tags, &Category::ALL);
///
/// assert_eq!(cleaned.get(Category::Vibe), ["Relax"]);
/// assert!(cleaned.get(Category::Highlights).is_empty());
/// ```
pub fn auto_cleanup(tags: &TagMap, priority: &[Category]) -> TagMap {
    let mut seen = HashSet::new();
    let mut cleaned = tags.clone();

    for &category in priority {
        if !tags.contains(category) {
            continue;
        }
        let kept = tags
            .get(category)
            .iter()
            .filter(|tag| match TagNormalizer::normalize_key(tag) {
                Some(key) => seen.insert(key),
                None => false,
            })
            .cloned()
            .collect();
        cleaned.set(category, kept);
    }

    cleaned
}

/// Categories whose list differs between two tag maps.
pub fn changed_categories(before: &TagMap, after: &TagMap) -> Vec<Category> {
    Category::ALL
        .into_iter()
        .filter(|&category| before.get(category) != after.get(category))
        .collect()
}
