//! autodoc CLI
//!
//! Ingests reference material into the vector store, generates
//! documentation with and without retrieval, and answers questions.

use anyhow::{Context, Result};
use autodoc_rag::{
    agent::AskAgent,
    chunker::Chunker,
    config::Config,
    document::load_directory,
    embedding::OllamaEmbedder,
    generator::{Generator, GeneratorOptions, Mode},
    indexer::{Indexer, IndexerOptions},
    llm::LlmClient,
    persistence::{self, SaveFormat},
    retriever::Retriever,
    store::{FileVectorStore, VectorStore},
    web::{CrawlOptions, Crawler},
};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

/// autodoc - baseline vs retrieval-augmented API documentation
#[derive(Parser)]
#[command(name = "autodoc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a directory of reference material (md, txt, pdf, C/C++)
    Ingest {
        /// Directory to walk recursively
        dir: PathBuf,
    },

    /// Crawl a documentation site and index its pages
    IngestWeb {
        /// Root URL; only pages under it are followed
        url: String,

        /// Levels of pages to load (1 = root only)
        #[arg(long, default_value_t = 2)]
        max_depth: usize,
    },

    /// Show what the vector store holds
    Inspect {
        /// Query to check retrieval with; may be repeated
        #[arg(short, long = "query")]
        queries: Vec<String>,

        /// Records sampled for the source listing
        #[arg(long, default_value_t = 100)]
        sample: usize,
    },

    /// Ask questions against the indexed references
    Ask {
        /// Chunks retrieved per question
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Generate documentation for one or more source files
    Generate {
        /// Source files to document
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Generation mode
        #[arg(long, value_enum, default_value_t = Mode::Rag)]
        mode: Mode,

        /// Chunks retrieved in rag mode
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Base output directory (docs land in <dir>/<mode>/)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Test LLM connection
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest { dir } => cmd_ingest(dir).await,
        Commands::IngestWeb { url, max_depth } => cmd_ingest_web(url, max_depth).await,
        Commands::Inspect { queries, sample } => cmd_inspect(queries, sample).await,
        Commands::Ask { top_k } => cmd_ask(top_k).await,
        Commands::Generate {
            files,
            mode,
            top_k,
            output_dir,
        } => cmd_generate(files, mode, top_k, output_dir).await,
        Commands::Test => cmd_test().await,
    }
}

fn load_config() -> Result<Config> {
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn open_store(config: &Config) -> Result<FileVectorStore> {
    let format = SaveFormat::from_name(&config.store.format).context("Invalid store format")?;
    Ok(FileVectorStore::open(config.store.db_dir.clone(), format))
}

async fn ingest_documents(config: &Config, documents: &[autodoc_rag::Document]) -> Result<()> {
    let start = Instant::now();

    let chunker = Chunker::new(config.chunking).context("Invalid chunking parameters")?;
    let chunks = chunker.split(documents);
    println!(
        "  Split {} documents into {} chunks (size {}, overlap {})",
        documents.len(),
        chunks.len(),
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let embedder = OllamaEmbedder::new(config.embedding.clone()).context("Failed to create embedder")?;
    let mut store = open_store(config)?;
    let indexer = Indexer::with_options(
        &embedder,
        IndexerOptions {
            batch_size: config.embedding.batch_size,
            dedup_by_source: config.store.dedup_by_source,
        },
    );

    println!("\nEmbedding with {}...", config.embedding.model);
    let written = indexer
        .index(&mut store, &chunks, &config.store.collection_name)
        .await
        .context("Indexing failed")?;

    let total = store.count(&config.store.collection_name)?;
    println!("\nIndex updated:");
    println!("  Chunks written:  {}", written);
    println!("  Collection:      {} ({} chunks)", config.store.collection_name, total);
    println!("  Store:           {}", store.dir().display());
    println!("  Time:            {:.2?}", start.elapsed());

    Ok(())
}

async fn cmd_ingest(dir: PathBuf) -> Result<()> {
    println!("Loading configuration...");
    let config = load_config()?;

    println!("Loading documents from: {}", dir.display());
    let documents = load_directory(&dir).context("Failed to load documents")?;
    if documents.is_empty() {
        println!("No supported documents found.");
        return Ok(());
    }
    for doc in &documents {
        println!("  {} ({} chars)", doc.source_uri, doc.char_count());
    }

    ingest_documents(&config, &documents).await
}

async fn cmd_ingest_web(url: String, max_depth: usize) -> Result<()> {
    println!("Loading configuration...");
    let config = load_config()?;

    println!("Crawling {} (max depth {})...", url, max_depth);
    let crawler = Crawler::new(CrawlOptions {
        max_depth,
        ..CrawlOptions::default()
    })?;
    let documents = crawler.crawl(&url).await.context("Crawl failed")?;
    if documents.is_empty() {
        println!("No pages with text found.");
        return Ok(());
    }
    println!("  Loaded {} pages", documents.len());

    ingest_documents(&config, &documents).await
}

async fn cmd_inspect(queries: Vec<String>, sample: usize) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;
    let collection = &config.store.collection_name;

    let count = store.count(collection)?;
    println!("Vector Store Information");
    println!("{}", "─".repeat(40));
    println!("  Store:        {}", store.dir().display());
    println!("  Collection:   {}", collection);
    println!("  Chunks:       {}", count);
    if let Some(model) = store.embedding_model(collection)? {
        println!("  Embeddings:   {}", model);
    }
    if let Ok(size) = persistence::file_size(&store.collection_path(collection)) {
        println!("  File size:    {:.1} KB", size as f64 / 1024.0);
    }

    if count == 0 {
        println!("\nCollection is empty. Run 'ingest' first.");
        return Ok(());
    }

    let sources: BTreeSet<String> = store
        .peek(collection, sample)?
        .into_iter()
        .map(|record| record.chunk.parent_source_uri)
        .collect();
    println!("\nSources in first {} chunks:", sample.min(count));
    for source in &sources {
        println!("  - {}", source);
    }

    if !queries.is_empty() {
        let embedder = OllamaEmbedder::new(config.embedding.clone()).context("Failed to create embedder")?;
        let retriever = Retriever::new(&embedder, &store, collection.clone());
        println!("\nTop match per query:");
        for query in &queries {
            let result = retriever.retrieve(query, 1).await.context("Retrieval failed")?;
            match result.hits.first() {
                Some(hit) => println!(
                    "  \"{}\" -> {} ({:.3})",
                    query, hit.chunk.parent_source_uri, hit.score
                ),
                None => println!("  \"{}\" -> no match", query),
            }
        }
    }

    Ok(())
}

async fn cmd_ask(top_k: Option<usize>) -> Result<()> {
    println!("Initializing...");
    let config = load_config()?;
    let store = open_store(&config)?;
    let embedder = OllamaEmbedder::new(config.embedding.clone()).context("Failed to create embedder")?;
    let llm = LlmClient::new(config.llm.clone());
    let retriever = Retriever::new(&embedder, &store, config.store.collection_name.clone());
    let agent = AskAgent::new(&llm, &retriever, top_k.unwrap_or(config.retrieval.top_k));

    println!("Agent Ready! Model: {} (Type 'exit' to quit)", llm.model());
    agent.run(BufReader::new(tokio::io::stdin())).await?;

    // An interrupted stdin read keeps a blocking thread alive until the next line.
    std::process::exit(0)
}

async fn cmd_generate(
    files: Vec<PathBuf>,
    mode: Mode,
    top_k: Option<usize>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    println!("Loading configuration...");
    let config = load_config()?;

    let options = GeneratorOptions {
        top_k: top_k.unwrap_or(config.retrieval.top_k),
        query_chars: config.retrieval.query_chars,
        output_dir: output_dir.unwrap_or_else(|| config.output.output_dir.clone()),
    };

    let start = Instant::now();
    let llm = LlmClient::new(config.llm.clone());
    let store = open_store(&config)?;
    let embedder = OllamaEmbedder::new(config.embedding.clone()).context("Failed to create embedder")?;
    let retriever = Retriever::new(&embedder, &store, config.store.collection_name.clone());

    println!("Generating {} documentation for {} file(s)", mode, files.len());
    println!("Using model: {}", llm.model());

    let generator = match mode {
        Mode::Rag => Generator::new(&llm, options).with_retriever(&retriever),
        Mode::NoRag => Generator::new(&llm, options),
    };

    let outcomes = generator.generate_batch(&files, mode).await;
    let failed = outcomes.iter().filter(|(_, outcome)| outcome.is_err()).count();

    println!("\nResults:");
    for (source, outcome) in &outcomes {
        match outcome {
            Ok(saved) => println!("  {} -> {}", source.display(), saved.display()),
            Err(e) => println!("  {} FAILED: {}", source.display(), e),
        }
    }
    println!(
        "\nGenerated {} of {} in {:.2?}",
        outcomes.len() - failed,
        outcomes.len(),
        start.elapsed()
    );

    if failed == outcomes.len() {
        anyhow::bail!("Generation failed for every file");
    }
    Ok(())
}

async fn cmd_test() -> Result<()> {
    println!("Testing LLM connection...\n");

    let config = Config::load().context("Failed to load configuration")?;

    println!("Configuration:");
    println!("  API Base:  {}", config.llm.api_base);
    println!("  Model:     {}", config.llm.model);
    if config.llm.api_key.is_empty() {
        println!("  API Key:   (none)");
    } else {
        let prefix: String = config.llm.api_key.chars().take(8).collect();
        println!("  API Key:   {}...", prefix);
    }
    println!();

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Ok(());
    }

    let client = LlmClient::new(config.llm);

    println!("Sending test request...");
    match client.test_connection().await {
        Ok(reply) => {
            println!("Connection successful! Reply: {}", reply.trim());
        }
        Err(e) => {
            println!("Connection failed: {}", e);
        }
    }

    Ok(())
}
