//! LegalMind service.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use legalmind_answer::Answerer;
use legalmind_core::{
    DocumentInfo, Embedder, Generator, RagConfig, RagError, Reranker, Result, Stats,
};
use legalmind_ingest::{
    collect_files, embed_in_batches, load_document, prepare_chunks, LoadedDocument,
    TokenWindowChunker,
};
use legalmind_providers::{create_embedder, create_generator, create_reranker};
use legalmind_query::{HybridRetriever, LexicalIndexCache};
use legalmind_store::SqliteStore;

use crate::schemas::{
    AskRequest, AskResponse, DebugPayload, IngestReport, IngestedDocument, SkippedFile,
};

/// LegalMind service state.
///
/// Owns the store and the capability handles; every request shares them.
pub struct LegalMindServer {
    /// Database store.
    store: Arc<SqliteStore>,

    /// Embedder used for ingestion (retrieval holds its own handle).
    embedder: Arc<dyn Embedder>,

    /// Hybrid retriever.
    retriever: HybridRetriever,

    /// Citation-guarded answerer.
    answerer: Answerer,

    /// Lexical index cache, invalidated whenever the corpus changes.
    lexical_cache: Arc<LexicalIndexCache>,

    /// Chunker.
    chunker: TokenWindowChunker,

    embed_batch_size: usize,
}

impl LegalMindServer {
    /// Create a server from configuration, opening the database and
    /// building providers.
    pub fn new(config: &RagConfig) -> Result<Self> {
        info!("Initializing LegalMind with database at {:?}", config.database.path);

        let store = Arc::new(SqliteStore::open_with_timeout(
            &config.database.path,
            config.database.busy_timeout_ms,
        )?);
        let embedder = create_embedder(&config.embedding)?;
        let reranker = create_reranker(&config.rerank)?;
        let generator = create_generator(&config.generation)?;

        Self::with_components(config, store, embedder, reranker, generator)
    }

    /// Create a server from explicit components.
    pub fn with_components(
        config: &RagConfig,
        store: Arc<SqliteStore>,
        embedder: Arc<dyn Embedder>,
        reranker: Arc<dyn Reranker>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        config.validate()?;

        let lexical_cache = Arc::new(LexicalIndexCache::new());
        let mut retriever = HybridRetriever::new(
            embedder.clone(),
            store.clone(),
            store.clone(),
            reranker,
            config.retrieval.clone(),
        );
        if config.retrieval.cache_lexical_index {
            retriever = retriever.with_cache(lexical_cache.clone());
        }

        Ok(Self {
            store,
            embedder,
            retriever,
            answerer: Answerer::new(generator),
            lexical_cache,
            chunker: TokenWindowChunker::from_config(&config.chunking)?,
            embed_batch_size: config.embedding.batch_size,
        })
    }

    /// Answer a question from the ingested documents.
    pub async fn ask(&self, request: AskRequest) -> Result<AskResponse> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(RagError::invalid_argument("query must not be empty"));
        }
        let doc_filter = request
            .doc_id
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        let outcome = self.retriever.retrieve(query, doc_filter).await?;
        let answer = self.answerer.answer(query, &outcome.contexts).await?;

        let debug = request
            .debug
            .then(|| DebugPayload::build(doc_filter, &outcome.fused, &outcome.contexts));

        Ok(AskResponse {
            answer: answer.text,
            citations: answer.citations,
            debug,
        })
    }

    /// Ingest a file, or every PDF and text file in a directory.
    pub async fn ingest_path(&self, path: &Path, recursive: bool) -> Result<IngestReport> {
        info!("Ingesting {:?} (recursive: {})", path, recursive);

        let single_file = path.is_file();
        let files = collect_files(path, recursive)?;
        let mut report = IngestReport::default();

        for file in files {
            let doc = match load_document(&file) {
                Ok(doc) => doc,
                Err(e @ RagError::LoadFailed { .. }) if !single_file => {
                    warn!("Skipping {:?}: {}", file, e);
                    report.skipped.push(SkippedFile {
                        path: file.display().to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.ingest_document(&doc).await? {
                Some(ingested) => report.documents.push(ingested),
                None => report.skipped.push(SkippedFile {
                    path: doc.source.clone(),
                    reason: "no text".to_string(),
                }),
            }
        }

        info!(
            "Ingested {} documents ({} chunks), skipped {}",
            report.documents.len(),
            report.chunks(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Chunk, embed and store one loaded document. Returns `None` when the
    /// document holds no text.
    pub async fn ingest_document(&self, doc: &LoadedDocument) -> Result<Option<IngestedDocument>> {
        let prepared = prepare_chunks(doc, &self.chunker);
        if prepared.is_empty() {
            warn!("Document {} has no text; skipping", doc.source);
            return Ok(None);
        }

        let texts: Vec<&str> = prepared.iter().map(|p| p.chunk.text.as_str()).collect();
        let embeddings =
            embed_in_batches(self.embedder.as_ref(), &texts, self.embed_batch_size).await?;

        let chunks: Vec<_> = prepared.iter().map(|p| p.chunk.clone()).collect();
        let indices: Vec<u32> = prepared.iter().map(|p| p.chunk_index).collect();

        self.store
            .upsert_document(&doc.doc_id, Some(&doc.title), Some(&doc.source))
            .await?;
        self.store
            .replace_document_chunks(&doc.doc_id, &chunks, &indices, &embeddings)
            .await?;
        self.lexical_cache.invalidate();

        info!("Stored {} ({} chunks)", doc.doc_id, chunks.len());

        Ok(Some(IngestedDocument {
            doc_id: doc.doc_id.clone(),
            source: doc.source.clone(),
            chunks: chunks.len(),
        }))
    }

    /// List all ingested documents.
    pub async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        self.store.list_documents().await
    }

    /// Look up one ingested document.
    pub async fn document(&self, doc_id: &str) -> Result<DocumentInfo> {
        self.store
            .get_document(doc_id)
            .await?
            .ok_or_else(|| RagError::DocumentNotFound {
                id: doc_id.to_string(),
            })
    }

    /// Remove a document and everything derived from it.
    pub async fn delete_document(&self, doc_id: &str) -> Result<()> {
        self.store.delete_document(doc_id).await?;
        self.lexical_cache.invalidate();
        info!("Deleted {}", doc_id);
        Ok(())
    }

    /// Corpus statistics.
    pub async fn stats(&self) -> Result<Stats> {
        self.store.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use legalmind_answer::REFUSAL;
    use legalmind_providers::{FusedOrderReranker, MockEmbedder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers by citing the first context chunk in the prompt.
    struct CitingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Generator for CitingGenerator {
        fn provider_name(&self) -> &str {
            "citing"
        }

        async fn generate(&self, _system: &str, user: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let first = user
                .lines()
                .find(|l| l.starts_with("(1) doc_id="))
                .and_then(|l| {
                    let rest = l.strip_prefix("(1) doc_id=")?;
                    let (doc, chunk) = rest.split_once(" chunk_id=")?;
                    Some(format!("[{}:{}]", doc, chunk))
                });
            Ok(match first {
                Some(token) => format!("ANSWER: English law {}\nCITATIONS: {}", token, token),
                None => REFUSAL.to_string(),
            })
        }
    }

    fn server_with(config: RagConfig) -> (LegalMindServer, Arc<CitingGenerator>) {
        let generator = Arc::new(CitingGenerator {
            calls: AtomicUsize::new(0),
        });
        let server = LegalMindServer::with_components(
            &config,
            Arc::new(SqliteStore::open_memory().unwrap()),
            Arc::new(MockEmbedder::with_dimension(64)),
            Arc::new(FusedOrderReranker),
            generator.clone(),
        )
        .unwrap();
        (server, generator)
    }

    fn server() -> (LegalMindServer, Arc<CitingGenerator>) {
        server_with(RagConfig::default())
    }

    fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[tokio::test]
    async fn test_ask_end_to_end() {
        let (server, _) = server();
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "contract.txt", "Contract governed by English law.");

        let report = server.ingest_path(&path, false).await.unwrap();
        assert_eq!(report.documents.len(), 1);
        let doc_id = report.documents[0].doc_id.clone();

        let response = server
            .ask(AskRequest::new("What law governs the contract?"))
            .await
            .unwrap();

        assert!(response.answer.starts_with("English law"));
        assert_eq!(response.citations.len(), 1);
        assert_eq!(response.citations[0].doc_id, doc_id);
        assert_eq!(response.citations[0].page, None);
        assert!(response.debug.is_none());
    }

    #[tokio::test]
    async fn test_ask_debug_payload_and_filter() {
        let (server, _) = server();
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "Governing law is English law.\x0cNotice is 30 days.");
        write(dir.path(), "b.txt", "Confidential information must be protected.");

        let report = server.ingest_path(dir.path(), false).await.unwrap();
        assert_eq!(report.documents.len(), 2);
        let a = report
            .documents
            .iter()
            .find(|d| d.source.ends_with("a.txt"))
            .unwrap()
            .doc_id
            .clone();

        let response = server
            .ask(AskRequest {
                query: "notice period".to_string(),
                doc_id: Some(a.clone()),
                debug: true,
            })
            .await
            .unwrap();

        let debug = response.debug.unwrap();
        assert_eq!(debug.doc_id_filter.as_deref(), Some(a.as_str()));
        assert_eq!(debug.fused_top.len(), 2);
        assert!(debug.fused_top.iter().all(|f| f.doc_id == a));
        assert!(debug.context_pages.iter().all(|p| p.page.is_some()));
        assert_eq!(response.citations[0].doc_id, a);
        assert!(response.citations[0].page.is_some());
    }

    #[tokio::test]
    async fn test_ask_empty_corpus_refuses() {
        let (server, generator) = server();

        let response = server.ask(AskRequest::new("Anything?")).await.unwrap();
        assert_eq!(response.answer, REFUSAL);
        assert!(response.citations.is_empty());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ask_rejects_empty_query() {
        let (server, _) = server();
        let err = server.ask(AskRequest::new("   ")).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let (server, _) = server();
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "lease.txt", "Rent is due monthly. The lease runs five years.");

        server.ingest_path(&path, false).await.unwrap();
        let before = server.stats().await.unwrap();
        server.ingest_path(&path, false).await.unwrap();
        let after = server.stats().await.unwrap();

        assert_eq!(before.documents, 1);
        assert_eq!(before.chunks, after.chunks);
        assert_eq!(before.embeddings, after.embeddings);

        let docs = server.list_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title.as_deref(), Some("lease"));
    }

    #[tokio::test]
    async fn test_directory_skips_unreadable_files() {
        let (server, _) = server();
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good.txt", "Clause one applies.");
        std::fs::write(dir.path().join("bad.txt"), [0xff, 0xfe]).unwrap();
        write(dir.path(), "empty.txt", "   ");

        let report = server.ingest_path(dir.path(), false).await.unwrap();
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.skipped.len(), 2);

        // A single unreadable file is an error
        assert!(server
            .ingest_path(&dir.path().join("bad.txt"), false)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_ingestion_invalidates_cached_index() {
        let mut config = RagConfig::default();
        config.retrieval.cache_lexical_index = true;
        let (server, _) = server_with(config);
        let dir = tempfile::tempdir().unwrap();

        write(dir.path(), "one.txt", "Arbitration takes place in London.");
        server.ingest_path(dir.path(), false).await.unwrap();
        server.ask(AskRequest::new("arbitration")).await.unwrap();
        assert_eq!(server.lexical_cache.len(), 1);

        write(dir.path(), "two.txt", "Indemnity is capped at the fees paid.");
        server.ingest_path(dir.path(), false).await.unwrap();
        assert!(server.lexical_cache.is_empty());

        let response = server
            .ask(AskRequest {
                query: "indemnity cap".to_string(),
                doc_id: None,
                debug: true,
            })
            .await
            .unwrap();
        let debug = response.debug.unwrap();
        assert_eq!(debug.fused_top.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_document() {
        let mut config = RagConfig::default();
        config.retrieval.cache_lexical_index = true;
        let (server, _) = server_with(config);
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "lease.txt", "Rent is due monthly.");
        write(dir.path(), "nda.txt", "Confidential information must be protected.");

        let report = server.ingest_path(dir.path(), false).await.unwrap();
        let doc_id = report.documents[0].doc_id.clone();
        assert_eq!(server.document(&doc_id).await.unwrap().doc_id, doc_id);

        server.ask(AskRequest::new("rent")).await.unwrap();
        assert_eq!(server.lexical_cache.len(), 1);

        server.delete_document(&doc_id).await.unwrap();
        assert!(server.lexical_cache.is_empty());
        assert_eq!(server.stats().await.unwrap().documents, 1);

        let err = server.document(&doc_id).await.unwrap_err();
        assert_eq!(err.error_code(), "DOCUMENT_NOT_FOUND");
        let err = server.delete_document(&doc_id).await.unwrap_err();
        assert_eq!(err.error_code(), "DOCUMENT_NOT_FOUND");
    }
}
