use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tag grouping on a location.
///
/// The declaration order is the retention priority used by auto-cleanup:
/// a tag repeated across categories survives in the earliest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Vibe,
    Target,
    Activities,
    Highlights,
    Tourism,
    Accommodation,
    Infrastructure,
    Sport,
    Info,
    General,
}

impl Category {
    /// Every category, in retention priority order.
    pub const ALL: [Category; 10] = [
        Category::Vibe,
        Category::Target,
        Category::Activities,
        Category::Highlights,
        Category::Tourism,
        Category::Accommodation,
        Category::Infrastructure,
        Category::Sport,
        Category::Info,
        Category::General,
    ];

    /// The free-text categories filled by SEO tag generation.
    pub const SEO: [Category; 7] = [
        Category::Highlights,
        Category::Tourism,
        Category::Accommodation,
        Category::Infrastructure,
        Category::Sport,
        Category::Info,
        Category::General,
    ];

    /// Returns the key used for this category inside a location's `tags` map.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vibe => "vibe",
            Self::Target => "target",
            Self::Activities => "activities",
            Self::Highlights => "highlights",
            Self::Tourism => "tourism",
            Self::Accommodation => "accommodation",
            Self::Infrastructure => "infrastructure",
            Self::Sport => "sport",
            Self::Info => "info",
            Self::General => "general",
        }
    }

    /// Whether this category belongs to the SEO set.
    pub fn is_seo(self) -> bool {
        Self::SEO.contains(&self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown tag category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == key)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_to_lowercase_key() {
        let json = serde_json::to_string(&Category::Infrastructure).unwrap();
        assert_eq!(json, r#""infrastructure""#);

        let parsed: Category = serde_json::from_str(r#""sport""#).unwrap();
        assert_eq!(parsed, Category::Sport);
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!("Highlights".parse::<Category>(), Ok(Category::Highlights));
        assert_eq!(" vibe ".parse::<Category>(), Ok(Category::Vibe));
    }

    #[test]
    fn from_str_rejects_unknown_names() {
        let err = "nations".parse::<Category>().unwrap_err();
        assert_eq!(err, UnknownCategory("nations".to_string()));
    }

    #[test]
    fn all_is_in_priority_order() {
        let mut sorted = Category::ALL;
        sorted.sort();
        assert_eq!(sorted, Category::ALL);
        assert_eq!(Category::ALL[0], Category::Vibe);
        assert_eq!(Category::ALL[9], Category::General);
    }

    #[test]
    fn seo_set_excludes_wizard_categories() {
        assert!(!Category::Vibe.is_seo());
        assert!(!Category::Target.is_seo());
        assert!(!Category::Activities.is_seo());
        assert!(Category::Highlights.is_seo());
        assert!(Category::General.is_seo());
    }
}
