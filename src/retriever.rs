//! Similarity retrieval over an indexed collection.

use crate::chunker::Chunk;
use crate::embedding::Embedder;
use crate::error::{AutodocError, Result};
use crate::store::VectorStore;
use serde::Serialize;
use tracing::debug;

/// Placeholder rendered when retrieval finds nothing.
pub const EMPTY_CONTEXT: &str = "None provided.";

/// One retrieved chunk.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    /// 1-based position in the result list.
    pub rank: usize,
    pub score: f32,
}

/// Ordered hits for one query, best first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievalResult {
    pub hits: Vec<RetrievedChunk>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Source URIs in rank order, without duplicates.
    pub fn sources(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for hit in &self.hits {
            let uri = hit.chunk.parent_source_uri.as_str();
            if !seen.contains(&uri) {
                seen.push(uri);
            }
        }
        seen
    }

    /// Render hits as `[Source i: uri]` blocks separated by `---`.
    ///
    /// An empty result renders as [`EMPTY_CONTEXT`].
    pub fn render_context(&self) -> String {
        if self.hits.is_empty() {
            return EMPTY_CONTEXT.to_string();
        }
        self.hits
            .iter()
            .map(|hit| {
                format!(
                    "[Source {}: {}]\n{}",
                    hit.rank,
                    hit.chunk.parent_source_uri,
                    hit.chunk.text.trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }
}

/// Retrieves the chunks most similar to a query.
pub struct Retriever<'a> {
    embedder: &'a dyn Embedder,
    store: &'a dyn VectorStore,
    collection: String,
}

impl<'a> Retriever<'a> {
    pub fn new(embedder: &'a dyn Embedder, store: &'a dyn VectorStore, collection: impl Into<String>) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
        }
    }

    /// Retrieve at most `k` chunks for `query`.
    ///
    /// A missing or empty collection gives an empty result without calling
    /// the embedder.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        if k == 0 || self.store.count(&self.collection)? == 0 {
            debug!(collection = %self.collection, "nothing to retrieve");
            return Ok(RetrievalResult::default());
        }

        if let Some(model) = self.store.embedding_model(&self.collection)? {
            if model != self.embedder.model_name() {
                return Err(AutodocError::InvalidConfig(format!(
                    "collection '{}' was indexed with '{}' but queries use '{}'",
                    self.collection,
                    model,
                    self.embedder.model_name()
                )));
            }
        }

        let query_vector = self.embedder.embed_query(query).await?;
        let hits = self
            .store
            .similarity_search(&self.collection, &query_vector, k)?
            .into_iter()
            .enumerate()
            .map(|(i, scored)| RetrievedChunk {
                chunk: scored.record.chunk,
                rank: i + 1,
                score: scored.score,
            })
            .collect::<Vec<_>>();

        debug!(collection = %self.collection, hits = hits.len(), "retrieved context");
        Ok(RetrievalResult { hits })
    }
}
