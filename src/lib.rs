pub mod ai;
pub mod config;
pub mod db;
pub mod models;
pub mod service;
pub mod store;
pub mod tags;
pub mod utils;

pub use config::Config;
pub use db::Database;
pub use models::{
    Category, DuplicateInfo, Location, LocationAnalysis, LocationId, TagMap, TagUsage,
};
pub use service::{BatchReport, CleanupOutcome, LocationError, LocationMergeReport, TagService};
pub use store::{DocumentStore, StoreError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_accessible_from_crate_root() {
        let db = Database::in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn types_accessible_from_crate_root() {
        let location = Location::new(
            "livigno",
            "Livigno",
            TagMap::from([(Category::Sport, vec!["Ski"])]),
        );
        assert_eq!(location.id(), &LocationId::new("livigno"));
        assert_eq!(format!("{}", Category::Sport), "sport");

        let report = BatchReport::default();
        assert!(report.is_complete());

        let service = TagService::new(Database::in_memory().unwrap());
        assert!(service.load_locations().unwrap().is_empty());
    }
}
