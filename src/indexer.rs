//! Indexer - embeds chunks and writes them to a vector store collection.
//!
//! Chunks are embedded in batches and each batch is written as soon as its
//! embeddings arrive. If the embedding backend fails mid-run, the batches
//! already written stay in the collection.

use crate::chunker::Chunk;
use crate::embedding::Embedder;
use crate::error::{AutodocError, Result};
use crate::store::{IndexRecord, VectorStore};
use std::collections::HashSet;
use tracing::{debug, info};

/// Options for indexing.
#[derive(Debug, Clone)]
pub struct IndexerOptions {
    /// Chunks per embedding request.
    pub batch_size: usize,
    /// Drop existing records of a source before re-indexing it.
    pub dedup_by_source: bool,
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self {
            batch_size: 32,
            dedup_by_source: false,
        }
    }
}

/// Embeds chunks and appends them to a collection.
pub struct Indexer<'a> {
    embedder: &'a dyn Embedder,
    options: IndexerOptions,
}

impl<'a> Indexer<'a> {
    /// Create a new indexer.
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self {
            embedder,
            options: IndexerOptions::default(),
        }
    }

    /// Create with custom options.
    pub fn with_options(embedder: &'a dyn Embedder, options: IndexerOptions) -> Self {
        Self { embedder, options }
    }

    /// Index `chunks` into `collection`. Returns how many records were written.
    pub async fn index(
        &self,
        store: &mut dyn VectorStore,
        chunks: &[Chunk],
        collection: &str,
    ) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let batch_size = self.options.batch_size.max(1);
        let total_batches = chunks.len().div_ceil(batch_size);
        let mut cleared: HashSet<&str> = HashSet::new();
        let mut written = 0usize;

        for (batch_no, batch) in chunks.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed(&texts).await.map_err(|e| match e {
                AutodocError::RetrievalBackendUnavailable(_) => e,
                other => AutodocError::RetrievalBackendUnavailable(other.to_string()),
            })?;

            if self.options.dedup_by_source {
                for chunk in batch {
                    if cleared.insert(chunk.parent_source_uri.as_str()) {
                        let removed = store.delete_by_source(collection, &chunk.parent_source_uri)?;
                        if removed > 0 {
                            debug!(source = %chunk.parent_source_uri, removed, "replaced existing records");
                        }
                    }
                }
            }

            let records: Vec<IndexRecord> = batch
                .iter()
                .zip(vectors)
                .map(|(chunk, embedding)| IndexRecord {
                    chunk: chunk.clone(),
                    embedding,
                    collection_name: collection.to_string(),
                })
                .collect();

            written += records.len();
            store.upsert(collection, self.embedder.model_name(), records)?;
            info!(
                batch = batch_no + 1,
                total_batches,
                written,
                "indexed batch into '{}'",
                collection
            );
        }

        Ok(written)
    }
}
