mod category;
mod duplicate_info;
mod ids;
mod location;
mod tag_usage;

pub use category::{Category, UnknownCategory};
pub use duplicate_info::{DuplicateInfo, LocationAnalysis};
pub use ids::LocationId;
pub use location::{Location, TagMap, UNNAMED_LOCATION};
pub use tag_usage::TagUsage;
