//! Reference documents and the loaders that produce them.
//!
//! A [`Document`] is one unit of reference material: a Markdown or text
//! file, the extracted text of a PDF, a C/C++ source file, or a crawled web
//! page. Documents are immutable once loaded and are consumed by the
//! chunker.

use crate::error::{AutodocError, Result};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions loaded as prose.
const TEXT_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];
/// Extensions loaded as C/C++ source.
const CODE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "h", "hh", "hpp"];

/// What kind of material a document holds. Drives separator choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Text,
    Code,
    Web,
}

impl DocumentKind {
    /// Classify a path by extension. `None` for files we do not ingest.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if TEXT_EXTENSIONS.contains(&ext.as_str()) || ext == "pdf" {
            Some(DocumentKind::Text)
        } else if CODE_EXTENSIONS.contains(&ext.as_str()) {
            Some(DocumentKind::Code)
        } else {
            None
        }
    }
}

/// A loaded piece of reference material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// SHA-256 hex digest of the source URI.
    pub id: String,
    /// File path or URL the content came from.
    pub source_uri: String,
    /// Full text content.
    pub content: String,
    pub kind: DocumentKind,
}

impl Document {
    /// Create a document from raw text.
    pub fn new(source_uri: impl Into<String>, content: impl Into<String>, kind: DocumentKind) -> Self {
        let source_uri = source_uri.into();
        Self {
            id: document_id(&source_uri),
            source_uri,
            content: content.into(),
            kind,
        }
    }

    /// Load a single file, choosing the kind from its extension.
    ///
    /// Unknown extensions are read as plain text.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AutodocError::InputMissing(path.to_path_buf()));
        }

        let kind = DocumentKind::from_path(path).unwrap_or(DocumentKind::Text);
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

        let content = if is_pdf {
            pdf_extract::extract_text(path).map_err(|e| AutodocError::Extraction {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            std::fs::read_to_string(path).map_err(|e| AutodocError::io(path, e))?
        };

        Ok(Self::new(path.display().to_string(), content, kind))
    }

    /// Number of characters in the document.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Recursively load every supported file under `dir`.
///
/// Files that fail to load are logged and skipped. Results are sorted by
/// path so ingestion order is reproducible.
pub fn load_directory(dir: &Path) -> Result<Vec<Document>> {
    if !dir.is_dir() {
        return Err(AutodocError::InputMissing(dir.to_path_buf()));
    }

    let mut paths: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| DocumentKind::from_path(path).is_some())
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        match Document::from_file(&path) {
            Ok(doc) => {
                debug!(source = %doc.source_uri, kind = ?doc.kind, chars = doc.char_count(), "loaded document");
                documents.push(doc);
            }
            Err(e) => warn!("skipping {}: {}", path.display(), e),
        }
    }

    Ok(documents)
}

/// Deterministic identifier for a source URI.
fn document_id(source_uri: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_uri.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("a/README.md")), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::from_path(Path::new("manual.PDF")), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::from_path(Path::new("mw.cpp")), Some(DocumentKind::Code));
        assert_eq!(DocumentKind::from_path(Path::new("mw.hpp")), Some(DocumentKind::Code));
        assert_eq!(DocumentKind::from_path(Path::new("image.png")), None);
        assert_eq!(DocumentKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_id_is_stable_per_source() {
        let a = Document::new("docs/a.md", "one", DocumentKind::Text);
        let b = Document::new("docs/a.md", "two", DocumentKind::Text);
        let c = Document::new("docs/b.md", "one", DocumentKind::Text);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_id_is_sha256_of_source() {
        let doc = Document::new("docs/a.md", "one", DocumentKind::Text);
        assert_eq!(
            doc.id,
            "5231f8a11b65145a1b0727cb8d209819e95360a5f1e17e4f757b61dbda1af3cc"
        );
    }

    #[test]
    fn test_from_file_missing() {
        let result = Document::from_file(Path::new("/nonexistent/file.md"));
        assert!(matches!(result, Err(AutodocError::InputMissing(_))));
    }

    #[test]
    fn test_load_directory_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.md"), "# B").unwrap();
        fs::write(dir.path().join("nested/a.cpp"), "int main() {}").unwrap();
        fs::write(dir.path().join("ignored.png"), [0u8, 1, 2]).unwrap();

        let docs = load_directory(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].source_uri.ends_with("b.md"));
        assert_eq!(docs[0].kind, DocumentKind::Text);
        assert!(docs[1].source_uri.ends_with("a.cpp"));
        assert_eq!(docs[1].kind, DocumentKind::Code);
    }

    #[test]
    fn test_load_directory_missing() {
        assert!(load_directory(Path::new("/nonexistent/dir")).is_err());
    }
}
