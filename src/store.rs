//! Vector store: named collections of embedded chunks.
//!
//! [`FileVectorStore`] keeps one file per collection under a directory
//! (`<name>.bin` or `<name>.json`) and caches loaded collections in memory.
//! [`MemoryVectorStore`] holds everything in process.

use crate::chunker::Chunk;
use crate::embedding::cosine_similarity;
use crate::error::{AutodocError, Result};
use crate::persistence::{self, SaveFormat};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// A chunk together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct IndexRecord {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
    pub collection_name: String,
}

/// A record returned from a similarity search.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub record: IndexRecord,
    pub score: f32,
}

/// Everything stored for one collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Encode, Decode)]
pub struct Collection {
    pub name: String,
    /// Model that produced every embedding in the collection.
    pub embedding_model: String,
    pub records: Vec<IndexRecord>,
}

fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

impl Collection {
    pub fn new(name: impl Into<String>, embedding_model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            embedding_model: embedding_model.into(),
            records: Vec::new(),
        }
    }

    /// Embedding dimension, if any record exists.
    pub fn dimension(&self) -> Option<usize> {
        self.records.first().map(|r| r.embedding.len())
    }

    fn append(&mut self, embedding_model: &str, records: Vec<IndexRecord>) -> Result<()> {
        if self.records.is_empty() {
            self.embedding_model = embedding_model.to_string();
        } else if self.embedding_model != embedding_model {
            return Err(AutodocError::InvalidConfig(format!(
                "collection '{}' was indexed with '{}', refusing vectors from '{}'",
                self.name, self.embedding_model, embedding_model
            )));
        }

        let expected = self.dimension().or_else(|| records.first().map(|r| r.embedding.len()));
        if let Some(dim) = expected {
            if let Some(bad) = records.iter().find(|r| r.embedding.len() != dim) {
                return Err(AutodocError::InvalidConfig(format!(
                    "embedding dimension mismatch in '{}': expected {}, got {}",
                    self.name,
                    dim,
                    bad.embedding.len()
                )));
            }
        }

        self.records.extend(records);
        Ok(())
    }

    fn remove_source(&mut self, source_uri: &str) -> usize {
        let before = self.records.len();
        self.records
            .retain(|r| r.chunk.parent_source_uri != source_uri);
        before - self.records.len()
    }

    /// Top `k` records by cosine similarity. Ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredRecord> {
        let mut scored: Vec<(usize, f32)> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (i, cosine_similarity(query, &r.embedding)))
            .collect();

        // NaN ranks below every real score; sort_by is stable, so ties keep insertion order.
        scored.sort_by(|a, b| rank_key(b.1).total_cmp(&rank_key(a.1)));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| ScoredRecord {
                record: self.records[i].clone(),
                score,
            })
            .collect()
    }
}

/// Storage backend for embedded chunks.
pub trait VectorStore: Send + Sync {
    /// Append records to a collection, creating it if needed.
    fn upsert(&mut self, collection: &str, embedding_model: &str, records: Vec<IndexRecord>) -> Result<()>;

    /// Remove every record from `source_uri`. Returns how many were removed.
    fn delete_by_source(&mut self, collection: &str, source_uri: &str) -> Result<usize>;

    /// Top `k` records by similarity. Missing collections yield no results.
    fn similarity_search(&self, collection: &str, query: &[f32], k: usize) -> Result<Vec<ScoredRecord>>;

    /// Number of records in a collection (0 if missing).
    fn count(&self, collection: &str) -> Result<usize>;

    /// The first `limit` records in insertion order.
    fn peek(&self, collection: &str, limit: usize) -> Result<Vec<IndexRecord>>;

    /// Embedding model a collection was built with.
    fn embedding_model(&self, collection: &str) -> Result<Option<String>>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    collections: HashMap<String, Collection>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorStore for MemoryVectorStore {
    fn upsert(&mut self, collection: &str, embedding_model: &str, records: Vec<IndexRecord>) -> Result<()> {
        self.collections
            .entry(collection.to_string())
            .or_insert_with(|| Collection::new(collection, embedding_model))
            .append(embedding_model, records)
    }

    fn delete_by_source(&mut self, collection: &str, source_uri: &str) -> Result<usize> {
        Ok(self
            .collections
            .get_mut(collection)
            .map(|c| c.remove_source(source_uri))
            .unwrap_or(0))
    }

    fn similarity_search(&self, collection: &str, query: &[f32], k: usize) -> Result<Vec<ScoredRecord>> {
        Ok(self
            .collections
            .get(collection)
            .map(|c| c.search(query, k))
            .unwrap_or_default())
    }

    fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.collections.get(collection).map_or(0, |c| c.records.len()))
    }

    fn peek(&self, collection: &str, limit: usize) -> Result<Vec<IndexRecord>> {
        Ok(self
            .collections
            .get(collection)
            .map(|c| c.records.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn embedding_model(&self, collection: &str) -> Result<Option<String>> {
        Ok(self
            .collections
            .get(collection)
            .map(|c| c.embedding_model.clone()))
    }
}

/// Store persisting one file per collection.
#[derive(Debug)]
pub struct FileVectorStore {
    dir: PathBuf,
    format: SaveFormat,
    cache: RwLock<HashMap<String, Arc<Collection>>>,
}

impl FileVectorStore {
    /// Open a store rooted at `dir`. The directory is created on first write.
    pub fn open(dir: impl Into<PathBuf>, format: SaveFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a collection's file.
    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", collection, self.format.extension()))
    }

    fn load(&self, collection: &str) -> Result<Option<Arc<Collection>>> {
        if let Ok(cache) = self.cache.read() {
            if let Some(found) = cache.get(collection) {
                return Ok(Some(Arc::clone(found)));
            }
        }

        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(None);
        }

        let loaded: Collection = persistence::load(&path)
            .map_err(|e| AutodocError::RetrievalBackendUnavailable(format!(
                "cannot read collection '{}': {}",
                collection, e
            )))?;
        debug!(collection, records = loaded.records.len(), "loaded collection");

        let loaded = Arc::new(loaded);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(collection.to_string(), Arc::clone(&loaded));
        }
        Ok(Some(loaded))
    }

    fn store(&self, collection: Collection) -> Result<()> {
        let path = self.collection_path(&collection.name);
        persistence::save(&collection, &path)?;
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(collection.name.clone(), Arc::new(collection));
        }
        Ok(())
    }
}

impl VectorStore for FileVectorStore {
    fn upsert(&mut self, collection: &str, embedding_model: &str, records: Vec<IndexRecord>) -> Result<()> {
        let mut current = match self.load(collection)? {
            Some(existing) => (*existing).clone(),
            None => Collection::new(collection, embedding_model),
        };
        current.append(embedding_model, records)?;
        self.store(current)
    }

    fn delete_by_source(&mut self, collection: &str, source_uri: &str) -> Result<usize> {
        let Some(existing) = self.load(collection)? else {
            return Ok(0);
        };
        let mut current = (*existing).clone();
        let removed = current.remove_source(source_uri);
        if removed > 0 {
            self.store(current)?;
        }
        Ok(removed)
    }

    fn similarity_search(&self, collection: &str, query: &[f32], k: usize) -> Result<Vec<ScoredRecord>> {
        Ok(self
            .load(collection)?
            .map(|c| c.search(query, k))
            .unwrap_or_default())
    }

    fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.load(collection)?.map_or(0, |c| c.records.len()))
    }

    fn peek(&self, collection: &str, limit: usize) -> Result<Vec<IndexRecord>> {
        Ok(self
            .load(collection)?
            .map(|c| c.records.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn embedding_model(&self, collection: &str) -> Result<Option<String>> {
        Ok(self.load(collection)?.map(|c| c.embedding_model.clone()))
    }
}
