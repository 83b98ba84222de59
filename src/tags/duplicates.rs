//! Detection of tags repeated within a single location.

use std::collections::HashMap;

use super::TagNormalizer;
use crate::models::{Category, DuplicateInfo, Location, LocationAnalysis, TagMap};

/// Occurrences of each normalized tag in first-seen order.
struct Occurrences {
    order: Vec<String>,
    categories: HashMap<String, Vec<Category>>,
    total: usize,
}

fn scan(tags: &TagMap, categories: &[Category]) -> Occurrences {
    let mut occurrences = Occurrences {
        order: Vec::new(),
        categories: HashMap::new(),
        total: 0,
    };

    for &category in categories {
        for tag in tags.get(category) {
            let Some(key) = TagNormalizer::normalize_key(tag) else {
                continue;
            };
            occurrences.total += 1;
            occurrences
                .categories
                .entry(key.clone())
                .or_insert_with(|| {
                    occurrences.order.push(key);
                    Vec::new()
                })
                .push(category);
        }
    }

    occurrences
}

/// Reports every normalized tag that appears more than once across the
/// given categories of one location.
///
/// Entries carry the lower-cased key, not a display form, and are sorted by
/// count, highest first; ties keep first-seen order. An empty result means
/// the location is clean. Repetition across different locations is not
/// visible here.
///
/// # Examples
///
/// ```
/// use loctag::{Category, TagMap};
/// use loctag::tags::find_duplicates;
///
/// let tags = TagMap::from([
///     (Category::Activities, vec!["Ski", "Hiking"]),
///     (Category::Sport, vec![" ski "]),
/// ]);
/// let duplicates = find_duplicates(&tags, &Category::ALL);
///
/// assert_eq!(duplicates.len(), 1);
/// assert_eq!(duplicates[0].tag, "ski");
/// assert_eq!(duplicates[0].count, 2);
/// assert_eq!(duplicates[0].categories, [Category::Activities, Category::Sport]);
/// ```
pub fn find_duplicates(tags: &TagMap, categories: &[Category]) -> Vec<DuplicateInfo> {
    collect_duplicates(scan(tags, categories))
}

fn collect_duplicates(mut occurrences: Occurrences) -> Vec<DuplicateInfo> {
    let mut duplicates: Vec<DuplicateInfo> = occurrences
        .order
        .into_iter()
        .filter_map(|tag| {
            let categories = occurrences.categories.remove(&tag)?;
            (categories.len() > 1).then(|| DuplicateInfo {
                count: categories.len(),
                tag,
                categories,
            })
        })
        .collect();

    duplicates.sort_by(|a, b| b.count.cmp(&a.count));
    duplicates
}

/// Builds the duplicate report for one location over every category.
pub fn analyze_location(location: &Location) -> LocationAnalysis {
    let occurrences = scan(location.tags(), &Category::ALL);
    let total_tags = occurrences.total;

    LocationAnalysis {
        id: location.id().clone(),
        name: location.name().to_string(),
        total_tags,
        duplicates: collect_duplicates(occurrences),
    }
}

/// Builds duplicate reports for many locations, most duplicated first.
pub fn analyze_locations(locations: &[Location]) -> Vec<LocationAnalysis> {
    let mut analyses: Vec<LocationAnalysis> = locations.iter().map(analyze_location).collect();
    analyses.sort_by(|a, b| b.duplicates.len().cmp(&a.duplicates.len()));
    analyses
}

/// Narrows reports by a case-insensitive name substring, optionally hiding
/// clean locations.
pub fn filter_analyses<'a>(
    analyses: &'a [LocationAnalysis],
    name_filter: &str,
    only_duplicates: bool,
) -> Vec<&'a LocationAnalysis> {
    let needle = name_filter.to_lowercase();
    analyses
        .iter()
        .filter(|analysis| !(only_duplicates && analysis.is_clean()))
        .filter(|analysis| analysis.name.to_lowercase().contains(&needle))
        .collect()
}
