//! Database schema definitions.

/// Main schema SQL for initializing the database.
pub const SCHEMA: &str = r#"
-- Documents table
CREATE TABLE IF NOT EXISTS documents (
    doc_id TEXT PRIMARY KEY,
    title TEXT,
    source TEXT,
    created_at INTEGER NOT NULL
);

-- Chunks table; chunk_id is content addressed
CREATE TABLE IF NOT EXISTS chunks (
    chunk_id TEXT PRIMARY KEY,
    doc_id TEXT NOT NULL REFERENCES documents(doc_id) ON DELETE CASCADE,
    chunk_index INTEGER NOT NULL,
    text TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_chunks_doc_position ON chunks(doc_id, chunk_index);

-- One embedding per chunk, little-endian f32 blob
CREATE TABLE IF NOT EXISTS embeddings (
    chunk_id TEXT PRIMARY KEY REFERENCES chunks(chunk_id) ON DELETE CASCADE,
    dimension INTEGER NOT NULL,
    embedding BLOB NOT NULL
);
"#;

/// Schema version for migrations.
pub const SCHEMA_VERSION: u32 = 1;
