//! SQLite-based storage implementation.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use legalmind_core::{
    Chunk, ChunkStore, DocumentInfo, Metadata, RagError, Result, Stats, VectorStore,
};

use crate::schema::{SCHEMA, SCHEMA_VERSION};

/// Default busy timeout when none is configured.
const DEFAULT_BUSY_TIMEOUT_MS: u32 = 30000;

/// SQLite-based store for documents, chunks and embeddings.
///
/// Nearest-neighbour search ranks rows with the `cosine_distance(blob, blob)`
/// SQL function registered on every connection.
pub struct SqliteStore {
    /// Connection wrapped in blocking Mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT_MS)
    }

    /// Open or create a database with an explicit busy timeout.
    pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout_ms: u32) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| RagError::database(format!("Failed to open database: {}", e)))?;

        let store = Self::init(conn, busy_timeout_ms)?;
        info!("Database opened at {:?}", path);
        Ok(store)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RagError::database(format!("Failed to open in-memory database: {}", e)))?;

        Self::init(conn, DEFAULT_BUSY_TIMEOUT_MS)
    }

    /// Initialize the store with a connection.
    fn init(conn: Connection, busy_timeout_ms: u32) -> Result<Self> {
        Self::configure_connection(&conn, busy_timeout_ms)?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| RagError::database(format!("Failed to initialize schema: {}", e)))?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(|e| RagError::database(format!("Failed to set schema version: {}", e)))?;

        Self::register_functions(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Configure SQLite connection for optimal performance.
    fn configure_connection(conn: &Connection, busy_timeout_ms: u32) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            "#,
        )
        .map_err(|e| RagError::database(format!("Failed to configure connection: {}", e)))?;

        conn.busy_timeout(Duration::from_millis(u64::from(busy_timeout_ms)))
            .map_err(|e| RagError::database(format!("Failed to set busy timeout: {}", e)))?;

        Ok(())
    }

    /// Register the `cosine_distance` scalar function.
    fn register_functions(conn: &Connection) -> Result<()> {
        conn.create_scalar_function(
            "cosine_distance",
            2,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let a: Vec<u8> = ctx.get(0)?;
                let b: Vec<u8> = ctx.get(1)?;
                let a = bytes_to_vec(&a)
                    .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;
                let b = bytes_to_vec(&b)
                    .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;
                cosine_distance(&a, &b).map_err(|e| rusqlite::Error::UserFunctionError(e.into()))
            },
        )
        .map_err(|e| RagError::database(format!("Failed to register cosine_distance: {}", e)))
    }

    /// Execute a blocking operation on the connection.
    fn with_conn<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let conn = self.conn.lock().map_err(|e| RagError::database(e.to_string()))?;
        f(&conn)
    }

    /// Insert or update a document record.
    pub async fn upsert_document(
        &self,
        doc_id: &str,
        title: Option<&str>,
        source: Option<&str>,
    ) -> Result<()> {
        let now = now_millis();
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO documents (doc_id, title, source, created_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (doc_id) DO UPDATE SET
                    title = COALESCE(excluded.title, documents.title),
                    source = COALESCE(excluded.source, documents.source)
                "#,
                params![doc_id, title, source, now as i64],
            )
            .map_err(|e| RagError::database(format!("Failed to upsert document: {}", e)))?;

            debug!("Upserted document: {}", doc_id);
            Ok(())
        })
    }

    /// Replace the chunks and embeddings stored for one document.
    ///
    /// Chunks left over from an earlier version of the document are removed;
    /// re-running with identical input leaves the store unchanged.
    pub async fn replace_document_chunks(
        &self,
        doc_id: &str,
        chunks: &[Chunk],
        chunk_indices: &[u32],
        embeddings: &[Vec<f32>],
    ) -> Result<()> {
        if chunks.len() != chunk_indices.len() || chunks.len() != embeddings.len() {
            return Err(RagError::invalid_argument(
                "chunks, chunk_indices and embeddings must have the same length",
            ));
        }
        if let Some(stray) = chunks.iter().find(|c| c.doc_id != doc_id) {
            return Err(RagError::invalid_argument(format!(
                "chunk {} belongs to {}, not {}",
                stray.chunk_id, stray.doc_id, doc_id
            )));
        }

        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| RagError::database(e.to_string()))?;

            tx.execute(
                "DELETE FROM embeddings WHERE chunk_id IN (SELECT chunk_id FROM chunks WHERE doc_id = ?1)",
                params![doc_id],
            )
            .map_err(|e| RagError::database(e.to_string()))?;
            tx.execute("DELETE FROM chunks WHERE doc_id = ?1", params![doc_id])
                .map_err(|e| RagError::database(e.to_string()))?;

            {
                let mut chunk_stmt = tx
                    .prepare(
                        r#"
                        INSERT INTO chunks (chunk_id, doc_id, chunk_index, text, metadata)
                        VALUES (?1, ?2, ?3, ?4, ?5)
                        ON CONFLICT (chunk_id) DO UPDATE SET
                            doc_id = excluded.doc_id,
                            chunk_index = excluded.chunk_index,
                            text = excluded.text,
                            metadata = excluded.metadata
                        "#,
                    )
                    .map_err(|e| RagError::database(e.to_string()))?;

                let mut embedding_stmt = tx
                    .prepare(
                        r#"
                        INSERT INTO embeddings (chunk_id, dimension, embedding)
                        VALUES (?1, ?2, ?3)
                        ON CONFLICT (chunk_id) DO UPDATE SET
                            dimension = excluded.dimension,
                            embedding = excluded.embedding
                        "#,
                    )
                    .map_err(|e| RagError::database(e.to_string()))?;

                for ((chunk, index), embedding) in
                    chunks.iter().zip(chunk_indices).zip(embeddings)
                {
                    let metadata = serde_json::to_string(&chunk.metadata)?;
                    chunk_stmt
                        .execute(params![
                            chunk.chunk_id,
                            chunk.doc_id,
                            index,
                            chunk.text,
                            metadata,
                        ])
                        .map_err(|e| RagError::database(format!("Failed to insert chunk: {}", e)))?;

                    embedding_stmt
                        .execute(params![
                            chunk.chunk_id,
                            embedding.len() as i64,
                            vec_to_bytes(embedding),
                        ])
                        .map_err(|e| {
                            RagError::database(format!("Failed to insert embedding: {}", e))
                        })?;
                }
            }

            tx.commit().map_err(|e| RagError::database(e.to_string()))?;

            debug!("Stored {} chunks for document {}", chunks.len(), doc_id);
            Ok(())
        })
    }

    /// Delete a document with its chunks and embeddings in one transaction.
    ///
    /// Nothing is removed when the document does not exist.
    pub async fn delete_document(&self, doc_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| RagError::database(e.to_string()))?;

            tx.execute(
                "DELETE FROM embeddings WHERE chunk_id IN (SELECT chunk_id FROM chunks WHERE doc_id = ?1)",
                params![doc_id],
            )
            .map_err(|e| RagError::database(e.to_string()))?;
            tx.execute("DELETE FROM chunks WHERE doc_id = ?1", params![doc_id])
                .map_err(|e| RagError::database(e.to_string()))?;
            let deleted = tx
                .execute("DELETE FROM documents WHERE doc_id = ?1", params![doc_id])
                .map_err(|e| RagError::database(e.to_string()))?;

            // Dropping the transaction rolls it back
            if deleted == 0 {
                return Err(RagError::DocumentNotFound {
                    id: doc_id.to_string(),
                });
            }

            tx.commit().map_err(|e| RagError::database(e.to_string()))?;

            debug!("Deleted document: {}", doc_id);
            Ok(())
        })
    }

    /// Look up a single document.
    pub async fn get_document(&self, doc_id: &str) -> Result<Option<DocumentInfo>> {
        self.with_conn(|conn| {
            conn.query_row(
                r#"
                SELECT d.doc_id, d.title, d.source, d.created_at,
                       (SELECT COUNT(*) FROM chunks c WHERE c.doc_id = d.doc_id)
                FROM documents d WHERE d.doc_id = ?1
                "#,
                params![doc_id],
                row_to_document,
            )
            .optional()
            .map_err(|e| RagError::database(e.to_string()))
        })
    }

    /// List all documents ordered by id.
    pub async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT d.doc_id, d.title, d.source, d.created_at,
                           (SELECT COUNT(*) FROM chunks c WHERE c.doc_id = d.doc_id)
                    FROM documents d
                    ORDER BY d.doc_id
                    "#,
                )
                .map_err(|e| RagError::database(e.to_string()))?;

            let docs = stmt
                .query_map([], row_to_document)
                .map_err(|e| RagError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| RagError::database(e.to_string()))?;

            Ok(docs)
        })
    }

    /// Corpus statistics.
    pub async fn stats(&self) -> Result<Stats> {
        self.with_conn(|conn| {
            let count = |sql: &str| -> Result<u64> {
                conn.query_row(sql, [], |row| row.get::<_, i64>(0))
                    .map(|n| n as u64)
                    .map_err(|e| RagError::database(e.to_string()))
            };

            let documents = count("SELECT COUNT(*) FROM documents")?;
            let chunks = count("SELECT COUNT(*) FROM chunks")?;
            let embeddings = count("SELECT COUNT(*) FROM embeddings")?;

            // Get page count and page size to estimate storage
            let page_count: u64 = conn
                .query_row("PRAGMA page_count", [], |row| row.get(0))
                .unwrap_or(0);
            let page_size: u64 = conn
                .query_row("PRAGMA page_size", [], |row| row.get(0))
                .unwrap_or(4096);

            Ok(Stats {
                documents,
                chunks,
                embeddings,
                storage_bytes: page_count * page_size,
            })
        })
    }
}

#[async_trait]
impl ChunkStore for SqliteStore {
    async fn list_chunks(&self, doc_filter: Option<&str>) -> Result<Vec<Chunk>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT chunk_id, doc_id, text, metadata
                    FROM chunks
                    WHERE ?1 IS NULL OR doc_id = ?1
                    ORDER BY doc_id, chunk_index
                    "#,
                )
                .map_err(|e| RagError::database(e.to_string()))?;

            let chunks = stmt
                .query_map(params![doc_filter], row_to_chunk)
                .map_err(|e| RagError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| RagError::database(e.to_string()))?;

            debug!("Listed {} chunks (filter: {:?})", chunks.len(), doc_filter);
            Ok(chunks)
        })
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn nearest(
        &self,
        query: &[f32],
        top_k: usize,
        doc_filter: Option<&str>,
    ) -> Result<Vec<(Chunk, f32)>> {
        if query.is_empty() {
            return Err(RagError::vector_search("query embedding is empty"));
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query_bytes = vec_to_bytes(query);

        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT c.chunk_id, c.doc_id, c.text, c.metadata,
                           cosine_distance(e.embedding, ?1) AS distance
                    FROM embeddings e
                    JOIN chunks c ON c.chunk_id = e.chunk_id
                    WHERE ?2 IS NULL OR c.doc_id = ?2
                    ORDER BY distance, c.doc_id, c.chunk_index
                    LIMIT ?3
                    "#,
                )
                .map_err(|e| RagError::vector_search(e.to_string()))?;

            let rows = stmt
                .query_map(params![query_bytes, doc_filter, top_k as i64], |row| {
                    let chunk = row_to_chunk(row)?;
                    let distance: f64 = row.get(4)?;
                    Ok((chunk, distance as f32))
                })
                .map_err(|e| RagError::vector_search(e.to_string()))?;

            let results: Vec<_> = rows
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| RagError::vector_search(e.to_string()))?;

            debug!("Vector search returned {} results", results.len());
            Ok(results)
        })
    }
}

/// Convert a row to a Chunk.
fn row_to_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chunk> {
    let metadata_str: String = row.get(3)?;
    let metadata: Metadata = serde_json::from_str(&metadata_str).unwrap_or_default();

    Ok(Chunk {
        chunk_id: row.get(0)?,
        doc_id: row.get(1)?,
        text: row.get(2)?,
        metadata,
    })
}

/// Convert a row to a DocumentInfo.
fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentInfo> {
    Ok(DocumentInfo {
        doc_id: row.get(0)?,
        title: row.get(1)?,
        source: row.get(2)?,
        created_at: row.get::<_, i64>(3)? as u64,
        chunks: row.get::<_, i64>(4)? as u64,
    })
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Convert f32 vector to bytes (little-endian).
fn vec_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert little-endian bytes back to an f32 vector.
fn bytes_to_vec(bytes: &[u8]) -> std::result::Result<Vec<f32>, String> {
    if bytes.len() % 4 != 0 {
        return Err(format!("embedding blob of {} bytes is not f32-aligned", bytes.len()));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Cosine distance (1 - cosine similarity). Zero vectors are at distance 1.
fn cosine_distance(a: &[f32], b: &[f32]) -> std::result::Result<f64, String> {
    if a.len() != b.len() {
        return Err(format!(
            "embedding dimension mismatch: stored {} vs query {}",
            a.len(),
            b.len()
        ));
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(1.0);
    }
    Ok(1.0 - dot / (norm_a.sqrt() * norm_b.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunk(doc_id: &str, index: u32, text: &str) -> Chunk {
        let mut meta = Metadata::new();
        meta.insert("page".to_string(), json!(index + 1));
        Chunk::new(Chunk::content_id(doc_id, index, text), doc_id, text).with_metadata(meta)
    }

    async fn seeded_store() -> (SqliteStore, Vec<Chunk>) {
        let store = SqliteStore::open_memory().unwrap();
        store.upsert_document("doc_a", Some("Lease"), Some("lease.txt")).await.unwrap();
        store.upsert_document("doc_b", Some("NDA"), None).await.unwrap();

        let a = vec![
            chunk("doc_a", 0, "Contract governed by English law."),
            chunk("doc_a", 1, "Notice period is 30 days."),
        ];
        let b = vec![chunk("doc_b", 0, "Confidential information must be protected.")];

        store
            .replace_document_chunks("doc_a", &a, &[0, 1], &[vec![1.0, 0.0], vec![0.0, 1.0]])
            .await
            .unwrap();
        store
            .replace_document_chunks("doc_b", &b, &[0], &[vec![0.7, 0.7]])
            .await
            .unwrap();

        let mut all = a;
        all.extend(b);
        (store, all)
    }

    #[tokio::test]
    async fn test_open_memory() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(store.list_chunks(None).await.unwrap().is_empty());
        assert!(store.list_documents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_chunks_order_and_filter() {
        let (store, chunks) = seeded_store().await;

        let all = store.list_chunks(None).await.unwrap();
        let ids: Vec<_> = all.iter().map(|c| c.chunk_id.clone()).collect();
        let expected: Vec<_> = chunks.iter().map(|c| c.chunk_id.clone()).collect();
        assert_eq!(ids, expected);
        assert_eq!(all[1].page(), Some(2));

        let only_b = store.list_chunks(Some("doc_b")).await.unwrap();
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b[0].doc_id, "doc_b");

        assert!(store.list_chunks(Some("doc_missing")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nearest_orders_by_distance() {
        let (store, _) = seeded_store().await;

        let hits = store.nearest(&[1.0, 0.1], 3, None).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].0.text, "Contract governed by English law.");
        assert!(hits[0].1 <= hits[1].1);
        assert!(hits[1].1 <= hits[2].1);

        let filtered = store.nearest(&[1.0, 0.1], 3, Some("doc_b")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].0.doc_id, "doc_b");

        let limited = store.nearest(&[1.0, 0.1], 1, None).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_nearest_dimension_mismatch_is_error() {
        let (store, _) = seeded_store().await;
        let err = store.nearest(&[1.0, 0.0, 0.0], 3, None).await.unwrap_err();
        assert_eq!(err.error_code(), "VECTOR_SEARCH_ERROR");
    }

    #[tokio::test]
    async fn test_replace_is_idempotent() {
        let (store, chunks) = seeded_store().await;
        let a: Vec<_> = chunks.iter().filter(|c| c.doc_id == "doc_a").cloned().collect();

        store
            .replace_document_chunks("doc_a", &a, &[0, 1], &[vec![1.0, 0.0], vec![0.0, 1.0]])
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.chunks, 3);
        assert_eq!(stats.embeddings, 3);
    }

    #[tokio::test]
    async fn test_replace_drops_stale_chunks() {
        let (store, _) = seeded_store().await;
        let revised = vec![chunk("doc_a", 0, "Contract governed by Scots law.")];

        store
            .replace_document_chunks("doc_a", &revised, &[0], &[vec![1.0, 0.0]])
            .await
            .unwrap();

        let a = store.list_chunks(Some("doc_a")).await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].text, "Contract governed by Scots law.");
        assert_eq!(store.stats().await.unwrap().embeddings, 2);
    }

    #[tokio::test]
    async fn test_replace_rejects_mismatched_input() {
        let store = SqliteStore::open_memory().unwrap();
        store.upsert_document("doc_a", None, None).await.unwrap();

        let c = chunk("doc_a", 0, "text");
        assert!(store
            .replace_document_chunks("doc_a", &[c.clone()], &[0], &[])
            .await
            .is_err());
        assert!(store
            .replace_document_chunks("doc_b", &[c], &[0], &[vec![1.0]])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_documents() {
        let (store, _) = seeded_store().await;

        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].doc_id, "doc_a");
        assert_eq!(docs[0].chunks, 2);
        assert_eq!(docs[0].title.as_deref(), Some("Lease"));

        // A later upsert without a title keeps the stored one
        store.upsert_document("doc_a", None, Some("lease-v2.txt")).await.unwrap();
        let doc = store.get_document("doc_a").await.unwrap().unwrap();
        assert_eq!(doc.title.as_deref(), Some("Lease"));
        assert_eq!(doc.source.as_deref(), Some("lease-v2.txt"));

        store.delete_document("doc_b").await.unwrap();
        assert!(store.get_document("doc_b").await.unwrap().is_none());
        assert!(store.list_chunks(Some("doc_b")).await.unwrap().is_empty());
        assert!(matches!(
            store.delete_document("doc_b").await,
            Err(RagError::DocumentNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_document_is_atomic() {
        let (store, _) = seeded_store().await;
        let before = store.stats().await.unwrap();

        let err = store.delete_document("doc_missing").await.unwrap_err();
        assert_eq!(err.error_code(), "DOCUMENT_NOT_FOUND");
        let unchanged = store.stats().await.unwrap();
        assert_eq!(unchanged.documents, before.documents);
        assert_eq!(unchanged.chunks, before.chunks);
        assert_eq!(unchanged.embeddings, before.embeddings);

        store.delete_document("doc_a").await.unwrap();
        let after = store.stats().await.unwrap();
        assert_eq!(after.documents, 1);
        assert_eq!(after.chunks, 1);
        assert_eq!(after.embeddings, 1);
        let left = store.list_chunks(None).await.unwrap();
        assert!(left.iter().all(|c| c.doc_id == "doc_b"));
    }

    #[tokio::test]
    async fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("legalmind.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.upsert_document("doc_a", None, None).await.unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.stats().await.unwrap().documents, 1);
    }

    #[test]
    fn test_cosine_distance() {
        assert!((cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).unwrap()).abs() < 1e-9);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]).unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 1.0);
        assert!(cosine_distance(&[1.0], &[1.0, 0.0]).is_err());
    }

    #[test]
    fn test_blob_roundtrip_alignment() {
        assert!(bytes_to_vec(&[0u8; 5]).is_err());
        assert_eq!(bytes_to_vec(&vec_to_bytes(&[0.5, -2.0])).unwrap(), vec![0.5, -2.0]);
    }
}
