//! Per-category tag usage across all loaded locations.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{Category, Location, LocationId, TagUsage};

/// Words ignored by [`word_stats`].
pub const WORD_STATS_STOP_WORDS: &[&str] = &[
    "e", "di", "a", "da", "in", "con", "su", "per", "tra", "fra", "il", "lo", "la", "i", "gli",
    "le", "un", "uno", "una", "and", "or", "the", "of", "to", "for", "with", "on", "at", "&", "-",
    "is",
];

/// Maximum number of rows returned by [`word_stats`].
pub const WORD_STATS_LIMIT: usize = 50;

/// Display order for a usage list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UsageSort {
    /// Most used first.
    #[default]
    Count,
    /// Case-insensitive alphabetical.
    Alpha,
}

/// Counts which locations use each tag string in one category.
///
/// Tags are only trimmed, never lower-cased, so `"Relax"` and `"relax"`
/// produce separate entries. Each entry lists location ids in first-seen
/// order; a location repeating a string in the same list is counted once.
/// The result is sorted by count, highest first, ties in first-seen order.
///
/// # Examples
///
/// ```
/// use loctag::{Category, Location, TagMap};
/// use loctag::tags::aggregate_usage;
///
/// let locations = vec![
///     Location::new("a", "A", TagMap::from([(Category::Highlights, vec!["Relax"])])),
///     Location::new("b", "B", TagMap::from([(Category::Highlights, vec!["relax"])])),
/// ];
/// let usage = aggregate_usage(&locations, Category::Highlights);
///
/// assert_eq!(usage.len(), 2);
/// assert!(usage.iter().all(|entry| entry.count() == 1));
/// ```
pub fn aggregate_usage(locations: &[Location], category: Category) -> Vec<TagUsage> {
    let mut usages: Vec<TagUsage> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for location in locations {
        for tag in location.tags().get(category) {
            let trimmed = tag.trim();
            if trimmed.is_empty() {
                continue;
            }
            let slot = *index.entry(trimmed.to_string()).or_insert_with(|| {
                usages.push(TagUsage::new(trimmed, Vec::new()));
                usages.len() - 1
            });
            usages[slot].push(location.id());
        }
    }

    usages.sort_by(|a, b| b.count().cmp(&a.count()));
    usages
}

/// Runs [`aggregate_usage`] for every SEO category.
pub fn aggregate_seo_usage(locations: &[Location]) -> BTreeMap<Category, Vec<TagUsage>> {
    Category::SEO
        .into_iter()
        .map(|category| (category, aggregate_usage(locations, category)))
        .collect()
}

/// Filters a usage list by case-insensitive substring and orders it.
pub fn filter_usage<'a>(usages: &'a [TagUsage], filter: &str, sort: UsageSort) -> Vec<&'a TagUsage> {
    let needle = filter.to_lowercase();
    let mut selected: Vec<&TagUsage> = usages
        .iter()
        .filter(|usage| usage.tag().to_lowercase().contains(&needle))
        .collect();

    match sort {
        UsageSort::Count => selected.sort_by(|a, b| b.count().cmp(&a.count())),
        UsageSort::Alpha => selected.sort_by(|a, b| compare_alpha(a.tag(), b.tag())),
    }

    selected
}

fn compare_alpha(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Picks the default merge destination for a selection: the selected tag
/// with the highest usage count.
pub fn default_merge_target(usages: &[TagUsage], selected: &HashSet<String>) -> Option<String> {
    usages
        .iter()
        .filter(|usage| selected.contains(usage.tag()))
        .fold(None::<&TagUsage>, |best, usage| match best {
            Some(current) if current.count() >= usage.count() => Some(current),
            _ => Some(usage),
        })
        .map(|usage| usage.tag().to_string())
}

/// Union of the location ids using any of the given tag strings, in
/// first-seen order.
pub fn locations_using(usages: &[TagUsage], tags: &HashSet<String>) -> Vec<LocationId> {
    let mut seen = HashSet::new();
    usages
        .iter()
        .filter(|usage| tags.contains(usage.tag()))
        .flat_map(|usage| usage.location_ids().iter())
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect()
}

/// Most frequent significant words across a category's tags.
///
/// Each tag is lower-cased and split on whitespace and `, . / ( ) " -`.
/// Words of two characters or fewer, numbers and stop words are skipped.
/// Every remaining word adds the tag's usage count. Returns at most
/// [`WORD_STATS_LIMIT`] rows, most frequent first.
pub fn word_stats(usages: &[TagUsage]) -> Vec<(String, usize)> {
    let stop_words: HashSet<&str> = WORD_STATS_STOP_WORDS.iter().copied().collect();
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, usize> = HashMap::new();

    for usage in usages {
        let lower = usage.tag().to_lowercase();
        let words = lower
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | '/' | '(' | ')' | '"' | '-'))
            .filter(|word| word.chars().count() > 2)
            .filter(|word| !stop_words.contains(word))
            .filter(|word| word.parse::<f64>().is_err());

        for word in words {
            let total = totals.entry(word.to_string()).or_insert_with(|| {
                order.push(word.to_string());
                0
            });
            *total += usage.count();
        }
    }

    let mut stats: Vec<(String, usize)> = order
        .into_iter()
        .map(|word| {
            let total = totals.get(&word).copied().unwrap_or_default();
            (word, total)
        })
        .collect();
    stats.sort_by(|a, b| b.1.cmp(&a.1));
    stats.truncate(WORD_STATS_LIMIT);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LocationId, TagMap};

    fn location(id: &str, category: Category, tags: Vec<&str>) -> Location {
        Location::new(id, id.to_uppercase(), TagMap::from([(category, tags)]))
    }

    #[test]
    fn casing_variants_are_separate_entries() {
        let locations = vec![
            location("a", Category::Highlights, vec!["Relax"]),
            location("b", Category::Highlights, vec!["relax"]),
        ];

        let usage = aggregate_usage(&locations, Category::Highlights);

        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].tag(), "Relax");
        assert_eq!(usage[0].count(), 1);
        assert_eq!(usage[1].tag(), "relax");
        assert_eq!(usage[1].count(), 1);
    }

    #[test]
    fn tags_are_trimmed_but_keep_casing() {
        let locations = vec![
            location("a", Category::Sport, vec![" Padel "]),
            location("b", Category::Sport, vec!["Padel"]),
        ];

        let usage = aggregate_usage(&locations, Category::Sport);

        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].tag(), "Padel");
        assert_eq!(
            usage[0].location_ids(),
            [LocationId::new("a"), LocationId::new("b")]
        );
    }

    #[test]
    fn sorted_by_count_with_first_seen_ties() {
        let locations = vec![
            location("a", Category::Sport, vec!["Tennis", "Ski"]),
            location("b", Category::Sport, vec!["Ski", "Golf"]),
            location("c", Category::Sport, vec!["Ski"]),
        ];

        let usage = aggregate_usage(&locations, Category::Sport);
        let tags: Vec<&str> = usage.iter().map(TagUsage::tag).collect();

        assert_eq!(tags, vec!["Ski", "Tennis", "Golf"]);
        assert_eq!(usage[0].count(), 3);
    }

    #[test]
    fn repeat_within_one_location_counts_each_occurrence() {
        let locations = vec![location("a", Category::Info, vec!["WiFi", "WiFi"])];

        let usage = aggregate_usage(&locations, Category::Info);

        assert_eq!(usage[0].count(), 2);
        assert_eq!(usage[0].location_ids(), [LocationId::new("a"), LocationId::new("a")]);
        let ids = locations_using(&usage, &HashSet::from(["WiFi".to_string()]));
        assert_eq!(ids, vec![LocationId::new("a")]);
    }

    #[test]
    fn other_categories_are_ignored() {
        let locations = vec![location("a", Category::Vibe, vec!["Relax"])];

        assert!(aggregate_usage(&locations, Category::Highlights).is_empty());
        let seo = aggregate_seo_usage(&locations);
        assert_eq!(seo.len(), Category::SEO.len());
        assert!(seo.values().all(Vec::is_empty));
    }

    #[test]
    fn filter_usage_matches_substring_and_sorts_alpha() {
        let usages = vec![
            TagUsage::new("Ski Bus", vec![LocationId::new("a")]),
            TagUsage::new("cable car", vec![LocationId::new("a"), LocationId::new("b")]),
            TagUsage::new("Ski Rental", vec![LocationId::new("c")]),
        ];

        let filtered = filter_usage(&usages, "SKI", UsageSort::Alpha);
        let tags: Vec<&str> = filtered.iter().map(|u| u.tag()).collect();
        assert_eq!(tags, vec!["Ski Bus", "Ski Rental"]);

        let all = filter_usage(&usages, "", UsageSort::Alpha);
        assert_eq!(all[0].tag(), "cable car");

        let by_count = filter_usage(&usages, "", UsageSort::Count);
        assert_eq!(by_count[0].tag(), "cable car");
    }

    #[test]
    fn default_merge_target_prefers_highest_count() {
        let usages = vec![
            TagUsage::new("Ski", vec![LocationId::new("a")]),
            TagUsage::new("Skiing", vec![LocationId::new("b"), LocationId::new("c")]),
            TagUsage::new("Golf", vec![LocationId::new("d"), LocationId::new("e"), LocationId::new("f")]),
        ];
        let selected: HashSet<String> = ["Ski", "Skiing"].into_iter().map(String::from).collect();

        assert_eq!(default_merge_target(&usages, &selected), Some("Skiing".into()));
        assert_eq!(default_merge_target(&usages, &HashSet::new()), None);
    }

    #[test]
    fn locations_using_unions_without_repeats() {
        let usages = vec![
            TagUsage::new("Ski", vec![LocationId::new("a"), LocationId::new("b")]),
            TagUsage::new("Skiing", vec![LocationId::new("b"), LocationId::new("c")]),
            TagUsage::new("Golf", vec![LocationId::new("d")]),
        ];
        let tags: HashSet<String> = ["Ski", "Skiing"].into_iter().map(String::from).collect();

        assert_eq!(
            locations_using(&usages, &tags),
            vec![LocationId::new("a"), LocationId::new("b"), LocationId::new("c")]
        );
    }

    #[test]
    fn word_stats_weights_words_by_usage() {
        let usages = vec![
            TagUsage::new("Lago di Braies", vec![LocationId::new("a"), LocationId::new("b")]),
            TagUsage::new("Lago (2000 m)", vec![LocationId::new("c")]),
            TagUsage::new("Views of the Lake", vec![LocationId::new("d")]),
        ];

        let stats = word_stats(&usages);

        assert_eq!(stats[0], ("lago".to_string(), 3));
        assert!(stats.contains(&("braies".to_string(), 2)));
        assert!(stats.contains(&("views".to_string(), 1)));
        assert!(stats.contains(&("lake".to_string(), 1)));
        assert!(!stats.iter().any(|(word, _)| word == "2000" || word == "di" || word == "the"));
    }

    #[test]
    fn word_stats_caps_rows() {
        let usages: Vec<TagUsage> = (0..60)
            .map(|i| TagUsage::new(format!("word{i}"), vec![LocationId::new("a")]))
            .collect();

        assert_eq!(word_stats(&usages).len(), WORD_STATS_LIMIT);
    }
}
