//! Documentation generation in baseline and retrieval-augmented modes.
//!
//! Each call renders one prompt and invokes the text generator exactly once.
//! In `rag` mode the prompt carries the rendered retrieval context, or
//! "None provided." when nothing was retrieved.

use crate::error::{AutodocError, Result};
use crate::llm::{Prompts, TextGenerator};
use crate::retriever::{RetrievalResult, Retriever};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Generation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Mode {
    /// Source file only.
    #[serde(rename = "no-rag")]
    #[value(name = "no-rag")]
    NoRag,
    /// Source file plus retrieved reference context.
    #[serde(rename = "rag")]
    #[value(name = "rag")]
    Rag,
}

impl Mode {
    /// Name used on the command line and for output directories.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::NoRag => "no-rag",
            Mode::Rag => "rag",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything produced by one generation call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationArtifact {
    pub target_file: String,
    pub mode: Mode,
    pub rendered_prompt: String,
    pub output_text: String,
}

impl GenerationArtifact {
    /// Write the generated Markdown to `<output_dir>/<mode>/<stem>.md`.
    pub fn save(&self, output_dir: &Path) -> Result<PathBuf> {
        let path = output_path(output_dir, self.mode, Path::new(&self.target_file));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AutodocError::io(parent, e))?;
        }
        std::fs::write(&path, &self.output_text).map_err(|e| AutodocError::io(&path, e))?;
        Ok(path)
    }
}

/// Where generated docs for `source` land.
pub fn output_path(output_dir: &Path, mode: Mode, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(mode.as_str()).join(format!("{}.md", stem))
}

/// Retrieval query for a source file: its name plus a prefix of its content.
pub fn retrieval_query(file_name: &str, file_content: &str, max_chars: usize) -> String {
    let prefix: String = file_content.chars().take(max_chars).collect();
    format!("API documentation context for: {}\n{}", file_name, prefix)
}

/// Render the prompt for `mode`.
pub fn render_prompt(file_content: &str, file_name: &str, mode: Mode, context: &RetrievalResult) -> String {
    match mode {
        Mode::NoRag => Prompts::render(
            Prompts::doc_baseline(),
            &[("file_name", file_name), ("file_content", file_content)],
        ),
        Mode::Rag => Prompts::render(
            Prompts::doc_augmented(),
            &[
                ("file_name", file_name),
                ("file_content", file_content),
                ("rag_context", &context.render_context()),
            ],
        ),
    }
}

/// Generator options.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Chunks retrieved per file in `rag` mode.
    pub top_k: usize,
    /// Characters of the file used in the retrieval query.
    pub query_chars: usize,
    /// Base directory for generated docs.
    pub output_dir: PathBuf,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            query_chars: 2000,
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Produces documentation for source files.
pub struct Generator<'a> {
    llm: &'a dyn TextGenerator,
    retriever: Option<&'a Retriever<'a>>,
    options: GeneratorOptions,
}

impl<'a> Generator<'a> {
    /// A generator without retrieval; `rag` mode then uses the empty context.
    pub fn new(llm: &'a dyn TextGenerator, options: GeneratorOptions) -> Self {
        Self {
            llm,
            retriever: None,
            options,
        }
    }

    /// Attach a retriever used for `rag` mode.
    pub fn with_retriever(mut self, retriever: &'a Retriever<'a>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Generate documentation for already-loaded content.
    pub async fn generate(
        &self,
        file_content: &str,
        file_name: &str,
        mode: Mode,
        context: &RetrievalResult,
    ) -> Result<GenerationArtifact> {
        let rendered_prompt = render_prompt(file_content, file_name, mode, context);
        info!(file = file_name, %mode, "generating documentation");
        let output_text = self.llm.invoke(&rendered_prompt).await?;

        Ok(GenerationArtifact {
            target_file: file_name.to_string(),
            mode,
            rendered_prompt,
            output_text,
        })
    }

    /// Context for `file_content` in `mode`. Empty for `no-rag`.
    pub async fn context_for(&self, file_name: &str, file_content: &str, mode: Mode) -> Result<RetrievalResult> {
        match (mode, self.retriever) {
            (Mode::NoRag, _) => Ok(RetrievalResult::default()),
            (Mode::Rag, None) => {
                warn!("no retriever configured, generating with empty context");
                Ok(RetrievalResult::default())
            }
            (Mode::Rag, Some(retriever)) => {
                let query = retrieval_query(file_name, file_content, self.options.query_chars);
                retriever.retrieve(&query, self.options.top_k).await
            }
        }
    }

    /// Read, retrieve, generate and save documentation for one file.
    pub async fn generate_file(&self, path: &Path, mode: Mode) -> Result<(GenerationArtifact, PathBuf)> {
        if !path.is_file() {
            return Err(AutodocError::InputMissing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| AutodocError::io(path, e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let context = self.context_for(&file_name, &content, mode).await?;
        if mode == Mode::Rag {
            info!(file = %file_name, hits = context.len(), "retrieved context");
        }

        let artifact = self.generate(&content, &file_name, mode, &context).await?;
        let saved = artifact.save(&self.options.output_dir)?;
        Ok((artifact, saved))
    }

    /// Generate documentation for several files, continuing past failures.
    pub async fn generate_batch(&self, paths: &[PathBuf], mode: Mode) -> Vec<(PathBuf, Result<PathBuf>)> {
        let mut outcomes = Vec::with_capacity(paths.len());
        for path in paths {
            let outcome = match self.generate_file(path, mode).await {
                Ok((_, saved)) => Ok(saved),
                Err(e) => {
                    warn!("generation failed for {}: {}", path.display(), e);
                    Err(e)
                }
            };
            outcomes.push((path.clone(), outcome));
        }
        outcomes
    }
}
