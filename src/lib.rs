//! autodoc-rag - baseline vs retrieval-augmented API documentation.
//!
//! Generates documentation for source files with and without retrieved
//! reference context, then scores both outputs with automatic metrics and
//! an LLM judge to decide which mode produced the better result.
//!
//! # Overview
//!
//! 1. Reference material (directories, PDFs, crawled sites) is split into
//!    overlapping chunks and embedded into a vector collection
//! 2. For each source file, the generator renders a prompt with or without
//!    the top-k retrieved chunks and asks the LLM for documentation
//! 3. Evaluation compares both outputs against a reference document
//!    (BLEU-1..4, token overlap) or a rubric-scoring judge
//!
//! # Quick Start
//!
//! ```no_run
//! use autodoc_rag::{
//!     chunker::Chunker,
//!     config::Config,
//!     document::load_directory,
//!     embedding::OllamaEmbedder,
//!     generator::{Generator, GeneratorOptions, Mode},
//!     indexer::Indexer,
//!     llm::LlmClient,
//!     persistence::SaveFormat,
//!     retriever::Retriever,
//!     store::FileVectorStore,
//! };
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     // Index reference material
//!     let documents = load_directory(Path::new("references"))?;
//!     let chunks = Chunker::new(config.chunking)?.split(&documents);
//!     let embedder = OllamaEmbedder::new(config.embedding.clone())?;
//!     let mut store = FileVectorStore::open(&config.store.db_dir, SaveFormat::Bincode);
//!     Indexer::new(&embedder)
//!         .index(&mut store, &chunks, &config.store.collection_name)
//!         .await?;
//!
//!     // Generate documentation with retrieved context
//!     let llm = LlmClient::new(config.llm.clone());
//!     let retriever = Retriever::new(&embedder, &store, config.store.collection_name.clone());
//!     let generator = Generator::new(&llm, GeneratorOptions::default()).with_retriever(&retriever);
//!     let (_, saved) = generator.generate_file(Path::new("src/bus.cpp"), Mode::Rag).await?;
//!     println!("Saved to {}", saved.display());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Chunker**: separator-aware splitting with bounded overlap
//! - **Indexer / VectorStore**: batched embedding into named collections
//! - **Retriever**: top-k similarity search rendered as prompt context
//! - **Generator**: one LLM call per file and mode
//! - **eval**: metric scoring, judge parsing and winner selection

pub mod agent;
pub mod chunker;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod eval;
pub mod generator;
pub mod indexer;
pub mod llm;
pub mod persistence;
pub mod retriever;
pub mod store;
pub mod web;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use agent::AskAgent;
pub use chunker::{Chunk, Chunker};
pub use config::Config;
pub use document::{Document, DocumentKind};
pub use embedding::{Embedder, OllamaEmbedder};
pub use error::{AutodocError, Result};
pub use generator::{GenerationArtifact, Generator, Mode};
pub use indexer::Indexer;
pub use llm::{LlmClient, TextGenerator};
pub use retriever::{RetrievalResult, Retriever};
pub use store::{FileVectorStore, MemoryVectorStore, VectorStore};
