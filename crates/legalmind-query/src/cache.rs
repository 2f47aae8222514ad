//! Lexical index cache keyed by document filter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use legalmind_core::{ChunkStore, Result};
use tracing::debug;

use crate::bm25::LexicalIndex;

#[derive(Default)]
struct CacheState {
    generation: u64,
    entries: HashMap<Option<String>, Arc<LexicalIndex>>,
}

/// Caches built lexical indexes until the next ingestion.
///
/// An index whose build started before an [`invalidate`](Self::invalidate)
/// is returned to its caller but never stored.
#[derive(Default)]
pub struct LexicalIndexCache {
    state: Mutex<CacheState>,
}

impl LexicalIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached index for `doc_filter`, building it on a miss.
    pub async fn get_or_build(
        &self,
        store: &dyn ChunkStore,
        doc_filter: Option<&str>,
    ) -> Result<Arc<LexicalIndex>> {
        let key = doc_filter.map(str::to_string);

        let generation = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(index) = state.entries.get(&key) {
                debug!("Lexical index cache hit (filter: {:?})", doc_filter);
                return Ok(index.clone());
            }
            state.generation
        };

        let index = Arc::new(LexicalIndex::from_store(store, doc_filter).await?);

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == generation {
            state.entries.insert(key, index.clone());
        }
        Ok(index)
    }

    /// Drop every cached index.
    pub fn invalidate(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.generation += 1;
        state.entries.clear();
        debug!("Lexical index cache invalidated (generation {})", state.generation);
    }

    /// Number of cached indexes.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
