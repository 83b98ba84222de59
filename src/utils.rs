//! Shared helpers for locating the database file and loading records.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::Location;
use crate::store::Document;

/// Gets the cross-platform database path.
///
/// Returns the path as `{data_dir}/loctag/locations.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn get_database_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("loctag").join("locations.db"))
}

/// Ensures the parent directory of the database file exists.
///
/// Creates the directory structure if it doesn't exist using `create_dir_all`.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}

/// Lifts the tag-relevant fields out of stored location documents.
pub fn locations_from_documents(documents: &[Document]) -> Vec<Location> {
    documents
        .iter()
        .map(|doc| Location::from_document(doc.id.as_str(), &doc.body))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::OffsetDateTime;

    #[test]
    fn get_database_path_returns_valid_path() {
        let path = get_database_path().unwrap();
        assert!(path.to_string_lossy().contains("loctag"));
        assert!(path.to_string_lossy().contains("locations.db"));
    }

    #[test]
    fn ensure_database_directory_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("deeper").join("db.sqlite");

        ensure_database_directory(&db_path).unwrap();

        assert!(db_path.parent().unwrap().is_dir());
    }

    #[test]
    fn locations_from_documents_keeps_ids() {
        let documents = vec![Document {
            id: "cortina".into(),
            body: json!({ "name": "Cortina", "tags": { "vibe": ["Luxury"] } }),
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }];

        let locations = locations_from_documents(&documents);

        assert_eq!(locations[0].id().as_str(), "cortina");
        assert_eq!(locations[0].name(), "Cortina");
    }
}
