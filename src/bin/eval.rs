//! Evaluation CLI for generated documentation.
//!
//! Usage:
//!   doc-eval judge <source>            # LLM judge, No-RAG vs RAG docs for a source file
//!   doc-eval bleu <ground_truth>       # BLEU / token overlap against a reference document
//!
//! Options:
//!   --no-rag-dir / --rag-dir <dir>     # Where generated docs live (judge)
//!   --no-rag / --rag <path>            # Generated docs to score (bleu)
//!   --output <path>                    # Save results to JSON file

use anyhow::{Context, Result};
use autodoc_rag::config::Config;
use autodoc_rag::document::Document;
use autodoc_rag::eval::{BLEU_RESULTS_FILE, DocJudge, JUDGE_RESULTS_FILE, MetricComparison};
use autodoc_rag::llm::LlmClient;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "doc-eval")]
#[command(about = "Evaluate No-RAG vs RAG generated documentation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score both generated docs for a source file with the LLM judge
    Judge {
        /// Path to the original source code file
        source: PathBuf,

        /// Directory containing No-RAG generated docs
        #[arg(long, default_value = "output/no-rag")]
        no_rag_dir: PathBuf,

        /// Directory containing RAG generated docs
        #[arg(long, default_value = "output/rag")]
        rag_dir: PathBuf,

        /// Save results to JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare generated docs with a reference document using BLEU and token overlap
    Bleu {
        /// Path to the ground truth documentation
        ground_truth: PathBuf,

        /// Path to No-RAG generated documentation
        #[arg(long)]
        no_rag: Option<PathBuf>,

        /// Path to RAG generated documentation
        #[arg(long)]
        rag: Option<PathBuf>,

        /// Save results to JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Judge {
            source,
            no_rag_dir,
            rag_dir,
            output,
        } => cmd_judge(source, no_rag_dir, rag_dir, output).await,
        Commands::Bleu {
            ground_truth,
            no_rag,
            rag,
            output,
        } => cmd_bleu(ground_truth, no_rag, rag, output),
    }
}

/// Generated doc path for a source file: `<dir>/<stem>.md`.
fn doc_path_for(dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!("{}.md", stem))
}

fn default_output(config: &Config, file_name: &str) -> PathBuf {
    config.output.output_dir.join(file_name)
}

async fn cmd_judge(
    source: PathBuf,
    no_rag_dir: PathBuf,
    rag_dir: PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    let no_rag_path = doc_path_for(&no_rag_dir, &source);
    let rag_path = doc_path_for(&rag_dir, &source);

    for path in [&source, &no_rag_path, &rag_path] {
        if !path.is_file() {
            eprintln!("Error: File not found: {}", path.display());
            std::process::exit(1);
        }
    }

    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    println!("Reading source: {}", source.display());
    let source_code = std::fs::read_to_string(&source)
        .with_context(|| format!("Failed to read {}", source.display()))?;
    println!("Reading No-RAG doc: {}", no_rag_path.display());
    let no_rag_doc = std::fs::read_to_string(&no_rag_path)
        .with_context(|| format!("Failed to read {}", no_rag_path.display()))?;
    println!("Reading RAG doc: {}", rag_path.display());
    let rag_doc = std::fs::read_to_string(&rag_path)
        .with_context(|| format!("Failed to read {}", rag_path.display()))?;

    println!("Judge model: {}", config.llm.model);
    let output = output.unwrap_or_else(|| default_output(&config, JUDGE_RESULTS_FILE));
    let llm = LlmClient::new(config.llm);
    let judge = DocJudge::new(&llm);

    println!("Evaluating No-RAG and RAG documentation...");
    let report = judge
        .evaluate(&source.display().to_string(), &source_code, &no_rag_doc, &rag_doc)
        .await;

    report.print_summary();
    report.save(&output).context("Failed to save results")?;
    println!("\nResults saved to: {}", output.display());

    Ok(())
}

/// Load a candidate doc, or `None` with a warning when it is absent.
fn load_candidate(label: &str, path: Option<&Path>) -> Result<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    if !path.is_file() {
        warn!("{} doc not found at {}, skipping", label, path.display());
        println!("Skipping {} doc (not found): {}", label, path.display());
        return Ok(None);
    }
    println!("Loading {} doc: {}", label, path.display());
    let doc = Document::from_file(path).with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(Some(doc.content))
}

fn cmd_bleu(
    ground_truth: PathBuf,
    no_rag: Option<PathBuf>,
    rag: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    if !ground_truth.is_file() {
        eprintln!("Error: Ground truth not found: {}", ground_truth.display());
        std::process::exit(1);
    }

    println!("Loading Ground Truth: {}", ground_truth.display());
    let reference = Document::from_file(&ground_truth)
        .with_context(|| format!("Failed to load {}", ground_truth.display()))?;

    let no_rag_doc = load_candidate("No-RAG", no_rag.as_deref())?;
    let rag_doc = load_candidate("RAG", rag.as_deref())?;

    let comparison = MetricComparison::score(
        &ground_truth.display().to_string(),
        &reference.content,
        no_rag_doc.as_deref(),
        rag_doc.as_deref(),
    );
    comparison.print_summary();

    let output = match output {
        Some(path) => path,
        None => {
            let config = Config::load().context("Failed to load configuration")?;
            default_output(&config, BLEU_RESULTS_FILE)
        }
    };
    comparison.save(&output).context("Failed to save results")?;
    println!("\nResults saved to: {}", output.display());

    Ok(())
}
