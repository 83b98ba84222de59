use std::collections::BTreeSet;

/// Known spellings of common tags, keyed by lower-cased form, mapped to the
/// label shown to visitors.
const LABEL_ALIASES: &[(&str, &str)] = &[
    // Cycling
    ("mountain biking", "Mountain Biking"),
    ("mountain biking routes", "Mountain Biking"),
    ("mtb", "Mountain Biking"),
    ("mtb trails", "Mountain Biking"),
    ("downhill biking", "Downhill"),
    ("downhill", "Downhill"),
    ("cycling", "Cycling"),
    ("road cycling", "Road Cycling"),
    ("e-bike", "E-Bike"),
    ("ebike", "E-Bike"),
    // Hiking
    ("hiking", "Hiking"),
    ("hiking trails", "Hiking"),
    ("trekking", "Trekking"),
    ("walking", "Walking"),
    ("nordic walking", "Nordic Walking"),
    // Winter
    ("skiing", "Skiing"),
    ("alpine skiing", "Alpine Skiing"),
    ("cross-country skiing", "Cross-country Skiing"),
    ("cross country skiing", "Cross-country Skiing"),
    ("xc skiing", "Cross-country Skiing"),
    ("snowboarding", "Snowboarding"),
    ("freeride", "Freeride"),
    ("ski touring", "Ski Touring"),
    ("snowshoeing", "Snowshoeing"),
    // Wellness
    ("spa", "Spa & Wellness"),
    ("wellness", "Spa & Wellness"),
    ("sauna", "Sauna"),
    ("thermal baths", "Thermal Baths"),
    // Climbing
    ("climbing", "Climbing"),
    ("rock climbing", "Climbing"),
    ("via ferrata", "Via Ferrata"),
    // Water
    ("swimming", "Swimming"),
    ("indoor swimming pool", "Swimming Pool"),
    ("outdoor swimming pool", "Swimming Pool"),
    ("lake", "Lake"),
    // Generic
    ("families", "Family Friendly"),
    ("family", "Family Friendly"),
    ("kids", "Family Friendly"),
    ("nightlife", "Nightlife"),
    ("apres ski", "Après-ski"),
    ("après-ski", "Après-ski"),
    ("apresski", "Après-ski"),
];

/// Comparison keys and display labels for free-text tags.
///
/// The comparison key (trim + lower-case) decides whether two strings are
/// the same tag. It is never written back to storage; stored tags keep
/// their original casing unless a rename or merge replaces them.
pub struct TagNormalizer;

impl TagNormalizer {
    /// Returns the comparison key for a tag, or `None` if it is blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctag::tags::TagNormalizer;
    ///
    /// assert_eq!(TagNormalizer::normalize_key(" Ski "), Some("ski".to_string()));
    /// assert_eq!(TagNormalizer::normalize_key("SKI"), Some("ski".to_string()));
    /// assert_eq!(TagNormalizer::normalize_key("   "), None);
    /// ```
    #[must_use]
    pub fn normalize_key(tag: &str) -> Option<String> {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        }
    }


    /// Maps a tag to its canonical display label.
    ///
    /// Known spellings resolve through the alias table; anything else is
    /// returned trimmed with its casing untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctag::tags::TagNormalizer;
    ///
    /// assert_eq!(TagNormalizer::canonical_label("MTB"), "Mountain Biking");
    /// assert_eq!(TagNormalizer::canonical_label(" apres ski "), "Après-ski");
    /// assert_eq!(TagNormalizer::canonical_label("Padel"), "Padel");
    /// ```
    #[must_use]
    pub fn canonical_label(tag: &str) -> String {
        let trimmed = tag.trim();
        let lower = trimmed.to_lowercase();

        LABEL_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lower)
            .map(|(_, label)| (*label).to_string())
            .unwrap_or_else(|| trimmed.to_string())
    }

    /// Maps every tag to its canonical label, dropping blanks and duplicates.
    ///
    /// The result is sorted.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctag::tags::TagNormalizer;
    ///
    /// let tags = vec!["mtb".to_string(), "Mountain Biking".to_string(), " ".to_string(), "Lake".to_string()];
    /// assert_eq!(TagNormalizer::canonical_labels(&tags), vec!["Lake", "Mountain Biking"]);
    /// ```
    #[must_use]
    pub fn canonical_labels(tags: &[String]) -> Vec<String> {
        tags.iter()
            .map(|tag| Self::canonical_label(tag))
            .filter(|tag| !tag.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
