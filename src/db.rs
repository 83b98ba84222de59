mod schema;

use std::path::Path;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use time::OffsetDateTime;

use crate::store::{Document, DocumentStore, StoreError, merge_values, set_path};
use schema::INITIAL_SCHEMA;

/// SQLite-backed document store.
///
/// Each document is one row holding a JSON body. Single-document writes are
/// atomic; nothing groups writes across documents.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens an in-memory SQLite database.
    ///
    /// Automatically initializes the schema on connection open.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Opens a file-based SQLite database at the given path.
    ///
    /// Creates the database file if it does not exist.
    /// Automatically initializes the schema on connection open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(INITIAL_SCHEMA)?;
        Ok(())
    }

    /// Returns a reference to the underlying connection.
    ///
    /// Useful for executing custom queries in tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn read_body(&self, collection: &str, id: &str) -> Result<Option<(String, i64)>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT body, updated_at FROM documents WHERE collection = ?1 AND id = ?2",
                (collection, id),
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    fn write_body(&self, collection: &str, id: &str, body: &Value) -> Result<(), StoreError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let text = serde_json::to_string(body)?;
        self.conn.execute(
            "INSERT INTO documents (collection, id, body, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(collection, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            (collection, id, text, now),
        )?;
        Ok(())
    }

    /// Runs a read-modify-write on one document inside a transaction.
    fn modify<F>(&self, collection: &str, id: &str, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(Option<Value>) -> Result<Value, StoreError>,
    {
        self.conn.execute("BEGIN IMMEDIATE", [])?;

        let result: Result<(), StoreError> = (|| {
            let current = match self.read_body(collection, id)? {
                Some((text, _)) => Some(serde_json::from_str(&text)?),
                None => None,
            };
            let next = f(current)?;
            self.write_body(collection, id, &next)
        })();

        match result {
            Ok(()) => {
                self.conn.execute("COMMIT", [])?;
                Ok(())
            }
            Err(e) => {
                self.conn.execute("ROLLBACK", []).ok();
                Err(e)
            }
        }
    }
}

fn to_document(id: String, text: &str, updated_at: i64) -> Result<Document, StoreError> {
    Ok(Document {
        id,
        body: serde_json::from_str(text)?,
        updated_at: OffsetDateTime::from_unix_timestamp(updated_at)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH),
    })
}

impl DocumentStore for Database {
    fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, body, updated_at FROM documents WHERE collection = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map([collection], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut documents = Vec::new();
        for row_result in rows {
            let (id, text, updated_at) = row_result?;
            documents.push(to_document(id, &text, updated_at)?);
        }

        Ok(documents)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.read_body(collection, id)?
            .map(|(text, updated_at)| to_document(id.to_string(), &text, updated_at))
            .transpose()
    }

    fn set(&self, collection: &str, id: &str, body: Value, merge: bool) -> Result<(), StoreError> {
        if !merge {
            return self.write_body(collection, id, &body);
        }

        self.modify(collection, id, |current| {
            let mut next = current.unwrap_or_else(|| Value::Object(Default::default()));
            merge_values(&mut next, body);
            Ok(next)
        })
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Vec<(String, Value)>,
    ) -> Result<(), StoreError> {
        self.modify(collection, id, |current| {
            let mut body = current.ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
            for (path, value) in fields {
                set_path(&mut body, &path, value)?;
            }
            Ok(body)
        })
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            (collection, id),
        )?;
        Ok(())
    }

    fn delete_many(&self, collection: &str, ids: &[String]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        // Build query with placeholders
        let placeholders: Vec<String> = (0..ids.len()).map(|i| format!("?{}", i + 2)).collect();
        let query = format!(
            "DELETE FROM documents WHERE collection = ?1 AND id IN ({})",
            placeholders.join(", ")
        );

        let params = std::iter::once(collection).chain(ids.iter().map(String::as_str));
        let deleted = self
            .conn
            .execute(&query, rusqlite::params_from_iter(params))?;
        Ok(deleted)
    }
}
