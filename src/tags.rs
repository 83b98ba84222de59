//! Pure tag maintenance logic.
//!
//! Everything here takes in-memory records and returns new records; no
//! function touches the store. The service layer reads documents, runs these
//! functions, and writes the results back one document at a time.
//!
//! # Examples
//!
//! ```
//! use loctag::{Category, Location, TagMap};
//! use loctag::tags::{aggregate_usage, auto_cleanup, find_duplicates};
//!
//! let location = Location::new(
//!     "cortina",
//!     "Cortina d'Ampezzo",
//!     TagMap::from([
//!         (Category::Vibe, vec!["Relax"]),
//!         (Category::Highlights, vec!["relax", "Tofane"]),
//!     ]),
//! );
//!
//! assert_eq!(find_duplicates(location.tags(), &Category::ALL).len(), 1);
//!
//! let cleaned = auto_cleanup(location.tags(), &Category::ALL);
//! assert_eq!(cleaned.get(Category::Highlights), ["Tofane"]);
//!
//! let usage = aggregate_usage(std::slice::from_ref(&location), Category::Highlights);
//! assert_eq!(usage.len(), 2);
//! ```

mod cleanup;
mod duplicates;
mod fuzzy;
mod merge;
mod normalizer;
mod usage;

pub use cleanup::{auto_cleanup, changed_categories};
pub use duplicates::{analyze_location, analyze_locations, filter_analyses, find_duplicates};
pub use fuzzy::{
    DEFAULT_MIN_WORD_LEN, DEFAULT_STOP_WORDS, FuzzyMatcher, MatcherConfig, ReferenceSet,
    build_reference_sets,
};
pub use merge::{MergePlan, TagError, remove_tag, union_tags};
pub use normalizer::TagNormalizer;
pub use usage::{
    UsageSort, WORD_STATS_LIMIT, WORD_STATS_STOP_WORDS, aggregate_seo_usage, aggregate_usage,
    default_merge_target, filter_usage, locations_using, word_stats,
};
