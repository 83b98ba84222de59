/// Document store schema.
///
/// Uses CREATE TABLE/INDEX IF NOT EXISTS for idempotent execution.
/// Bodies are JSON text; the store never inspects them beyond dotted-path
/// updates applied in Rust.
pub const INITIAL_SCHEMA: &str = r#"
-- Documents table: one row per document, keyed by collection and id
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (collection, id)
);

-- Index for listing a whole collection
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
"#;
