//! Reconciliation of AI-proposed tags with tags already in use.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use super::TagNormalizer;
use crate::models::{Category, Location};

/// Connector words ignored when comparing significant words.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "della", "delle", "degli", "nella", "nelle", "negli", "con", "per", "tra", "fra", "and", "the",
    "del", "al", "i", "le", "gli",
];

/// Shortest word length, in characters, that counts as significant.
pub const DEFAULT_MIN_WORD_LEN: usize = 2;

/// Tuning of the significant-word rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherConfig {
    pub stop_words: HashSet<String>,
    pub min_word_len: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            min_word_len: DEFAULT_MIN_WORD_LEN,
        }
    }
}

impl MatcherConfig {
    fn significant_words<'a>(&self, normalized: &'a str) -> Vec<&'a str> {
        normalized
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .filter(|word| word.chars().count() >= self.min_word_len)
            .filter(|word| !self.stop_words.contains(*word))
            .collect()
    }

    /// Whether two tags name the same concept.
    ///
    /// True on equal keys, on containment of one key in the other, or when
    /// the two share a significant word.
    pub fn similar(&self, a: &str, b: &str) -> bool {
        let (Some(a), Some(b)) = (TagNormalizer::normalize_key(a), TagNormalizer::normalize_key(b))
        else {
            return false;
        };

        if a == b || a.contains(&b) || b.contains(&a) {
            return true;
        }

        let words_b = self.significant_words(&b);
        self.significant_words(&a)
            .iter()
            .any(|word| words_b.contains(word))
    }
}

/// Tags already in use for one category, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    tags: Vec<String>,
    seen: HashSet<String>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag unless the exact string is already present.
    pub fn insert(&mut self, tag: &str) {
        if !tag.trim().is_empty() && self.seen.insert(tag.to_string()) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

/// Builds one reference set per SEO category from loaded locations.
///
/// The sets are a snapshot; edits made after this call are not seen.
pub fn build_reference_sets(locations: &[Location]) -> BTreeMap<Category, ReferenceSet> {
    let mut sets: BTreeMap<Category, ReferenceSet> = Category::SEO
        .into_iter()
        .map(|category| (category, ReferenceSet::new()))
        .collect();

    for location in locations {
        for (category, set) in sets.iter_mut() {
            for tag in location.tags().get(*category) {
                set.insert(tag);
            }
        }
    }

    sets
}

/// Matches proposed tags against a reference set.
pub struct FuzzyMatcher<'a> {
    config: &'a MatcherConfig,
}

impl<'a> FuzzyMatcher<'a> {
    pub fn new(config: &'a MatcherConfig) -> Self {
        Self { config }
    }

    /// Finds the existing tag a proposal should be replaced with.
    ///
    /// A case-insensitive exact match anywhere in the set wins first.
    /// Otherwise the first reference, in set order, that is similar by
    /// containment or shared significant word is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctag::tags::{FuzzyMatcher, MatcherConfig, ReferenceSet};
    ///
    /// let config = MatcherConfig::default();
    /// let matcher = FuzzyMatcher::new(&config);
    /// let mut reference = ReferenceSet::new();
    /// reference.insert("Biking");
    /// reference.insert("ski");
    ///
    /// assert_eq!(matcher.find_match("SKI", &reference), Some("ski"));
    /// assert_eq!(matcher.find_match("Mountain Biking", &reference), Some("Biking"));
    /// assert_eq!(matcher.find_match("Padel", &reference), None);
    /// ```
    pub fn find_match<'r>(&self, proposed: &str, reference: &'r ReferenceSet) -> Option<&'r str> {
        let key = TagNormalizer::normalize_key(proposed)?;

        reference
            .iter()
            .find(|existing| TagNormalizer::normalize_key(existing).as_deref() == Some(key.as_str()))
            .or_else(|| {
                reference
                    .iter()
                    .find(|existing| self.config.similar(proposed, existing))
            })
    }

    /// Reconciles a batch of proposals for one category.
    ///
    /// Matched proposals take the existing string; unmatched ones are kept
    /// trimmed and join the reference set so later proposals in the same
    /// batch can match them. Blank proposals are dropped and the result has
    /// no exact-string repeats.
    pub fn reconcile(&self, proposals: &[String], reference: &mut ReferenceSet) -> Vec<String> {
        let mut accepted: Vec<String> = Vec::new();

        for proposed in proposals {
            let trimmed = proposed.trim();
            if trimmed.is_empty() {
                continue;
            }

            let chosen = match self.find_match(trimmed, reference) {
                Some(existing) => {
                    if existing != trimmed {
                        debug!(proposed = trimmed, existing, "converted proposed tag to existing");
                    }
                    existing.to_string()
                }
                None => {
                    reference.insert(trimmed);
                    trimmed.to_string()
                }
            };

            if !accepted.contains(&chosen) {
                accepted.push(chosen);
            }
        }

        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TagMap;

    fn reference(tags: &[&str]) -> ReferenceSet {
        let mut set = ReferenceSet::new();
        for tag in tags {
            set.insert(tag);
        }
        set
    }

    fn strings(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn exact_match_is_case_insensitive() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);

        assert_eq!(matcher.find_match("SKI", &reference(&["ski"])), Some("ski"));
        assert_eq!(matcher.find_match(" Ski ", &reference(&["ski"])), Some("ski"));
    }

    #[test]
    fn exact_match_beats_earlier_fuzzy_candidate() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);

        let set = reference(&["Ski Alpino", "ski"]);

        assert_eq!(matcher.find_match("Ski", &set), Some("ski"));
    }

    #[test]
    fn substring_either_direction_matches() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);

        assert_eq!(
            matcher.find_match("Mountain Biking", &reference(&["Biking"])),
            Some("Biking")
        );
        assert_eq!(
            matcher.find_match("Lake", &reference(&["Lake Braies"])),
            Some("Lake Braies")
        );
    }

    #[test]
    fn shared_significant_word_matches() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);

        assert_eq!(
            matcher.find_match("Panoramic Views", &reference(&["Views"])),
            Some("Views")
        );
        assert_eq!(
            matcher.find_match("Cable-Car Rides", &reference(&["Scenic_Rides"])),
            Some("Scenic_Rides")
        );
    }

    #[test]
    fn stop_words_do_not_count_as_shared() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);

        assert_eq!(
            matcher.find_match("Sentiero della Pace", &reference(&["Rifugio della Montagna"])),
            None
        );
    }

    #[test]
    fn stop_words_and_min_length_are_configurable() {
        let config = MatcherConfig {
            stop_words: HashSet::from(["views".to_string()]),
            min_word_len: 2,
        };
        let matcher = FuzzyMatcher::new(&config);

        assert_eq!(
            matcher.find_match("Panoramic Views", &reference(&["Lake Views"])),
            None
        );

        let strict = MatcherConfig {
            stop_words: HashSet::new(),
            min_word_len: 5,
        };
        let matcher = FuzzyMatcher::new(&strict);
        assert_eq!(matcher.find_match("Spa Area", &reference(&["Spa Hotel"])), None);
    }

    #[test]
    fn unmatched_proposals_join_the_batch_reference() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);
        let mut set = reference(&["Golf"]);

        let accepted = matcher.reconcile(&strings(&["Padel Courts", "padel"]), &mut set);

        assert_eq!(accepted, strings(&["Padel Courts"]));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn reconcile_dedups_and_skips_blanks() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);
        let mut set = reference(&["ski"]);

        let accepted = matcher.reconcile(&strings(&["Ski", "SKI", " ", "Tennis"]), &mut set);

        assert_eq!(accepted, strings(&["ski", "Tennis"]));
    }

    #[test]
    fn reference_sets_cover_seo_categories_only() {
        let locations = vec![Location::new(
            "a",
            "A",
            TagMap::from([
                (Category::Vibe, vec!["Relax"]),
                (Category::Sport, vec!["Ski", "Ski", "Padel"]),
            ]),
        )];

        let sets = build_reference_sets(&locations);

        assert!(!sets.contains_key(&Category::Vibe));
        let sport: Vec<&str> = sets[&Category::Sport].iter().collect();
        assert_eq!(sport, vec!["Ski", "Padel"]);
    }
}
