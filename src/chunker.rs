//! Recursive separator text chunker.
//!
//! Splits documents into overlapping chunks of at most `chunk_size`
//! characters. Separators are tried in priority order (paragraph, line,
//! space, character for prose; declaration and statement keywords first for
//! C/C++ source). The first separator that occurs in a span is used to cut
//! it into pieces, each piece keeping its leading separator. Pieces shorter
//! than `chunk_size` are merged greedily into windows; a piece that is too
//! long on its own is split again with the remaining separators.
//!
//! When a window is emitted, its trailing pieces totalling at most
//! `chunk_overlap` characters are carried into the next window, so
//! neighbouring chunks share context across the boundary.
//!
//! Every chunk is an exact substring of its document. Dropping the first
//! `overlap_with_predecessor` characters of each chunk after the first and
//! concatenating the rest gives back the original text.

use crate::config::ChunkConfig;
use crate::document::{Document, DocumentKind};
use crate::error::{AutodocError, Result};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ops::Range;

/// Separators for prose documents.
pub const TEXT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Separators for crawled web pages.
pub const WEB_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// Separators for C/C++ source.
pub const CODE_SEPARATORS: &[&str] = &[
    "\nclass ", "\nvoid ", "\nint ", "\nfloat ", "\ndouble ", "\nif ", "\nfor ", "\nwhile ",
    "\nswitch ", "\ncase ", "\n\n", "\n", " ", "",
];

/// Separator priority for a document kind.
pub fn separators_for(kind: DocumentKind) -> &'static [&'static str] {
    match kind {
        DocumentKind::Text => TEXT_SEPARATORS,
        DocumentKind::Web => WEB_SEPARATORS,
        DocumentKind::Code => CODE_SEPARATORS,
    }
}

/// A bounded slice of a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct Chunk {
    /// Source URI of the document this chunk came from.
    pub parent_source_uri: String,
    /// Position of the chunk within its document.
    pub index: usize,
    /// Chunk text (at most `chunk_size` characters).
    pub text: String,
    /// Characters at the start of `text` repeated from the previous chunk.
    pub overlap_with_predecessor: usize,
}

impl Chunk {
    /// Text after the overlap prefix, i.e. the part this chunk adds.
    pub fn novel_text(&self) -> &str {
        match self.text.char_indices().nth(self.overlap_with_predecessor) {
            Some((byte, _)) => &self.text[byte..],
            None if self.overlap_with_predecessor == 0 => &self.text,
            None => "",
        }
    }
}

/// Chunker bound to a validated [`ChunkConfig`].
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    /// Create a chunker. Fails if the overlap is not smaller than the size.
    pub fn new(config: ChunkConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(AutodocError::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(AutodocError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    /// Split documents into chunks, preserving document order.
    pub fn split(&self, documents: &[Document]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| self.split_document(doc))
            .collect()
    }

    /// Split one document using the separators for its kind.
    pub fn split_document(&self, document: &Document) -> Vec<Chunk> {
        self.split_text(
            &document.source_uri,
            &document.content,
            separators_for(document.kind),
        )
    }

    /// Split raw text with an explicit separator priority.
    pub fn split_text(&self, source_uri: &str, text: &str, separators: &[&str]) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut ranges = Vec::new();
        self.split_range(text, 0..text.len(), separators, &mut ranges);

        let mut chunks = Vec::with_capacity(ranges.len());
        let mut prev_end = 0usize;
        for (index, range) in ranges.into_iter().enumerate() {
            let overlap = if index > 0 && range.start < prev_end {
                text[range.start..prev_end].chars().count()
            } else {
                0
            };
            prev_end = range.end;
            chunks.push(Chunk {
                parent_source_uri: source_uri.to_string(),
                index,
                text: text[range].to_string(),
                overlap_with_predecessor: overlap,
            });
        }
        chunks
    }

    fn split_range(
        &self,
        text: &str,
        range: Range<usize>,
        separators: &[&str],
        out: &mut Vec<Range<usize>>,
    ) {
        let segment = &text[range.clone()];
        let (separator, remaining) = pick_separator(segment, separators);

        let mut good: Vec<(Range<usize>, usize)> = Vec::new();
        for piece in split_keeping_separator(segment, separator) {
            let piece = (piece.start + range.start)..(piece.end + range.start);
            let len = text[piece.clone()].chars().count();
            if len < self.config.chunk_size {
                good.push((piece, len));
                continue;
            }

            if !good.is_empty() {
                self.merge(&good, out);
                good.clear();
            }
            if remaining.is_empty() {
                out.push(piece);
            } else {
                self.split_range(text, piece, remaining, out);
            }
        }

        if !good.is_empty() {
            self.merge(&good, out);
        }
    }

    /// Merge contiguous pieces into windows of at most `chunk_size` chars.
    fn merge(&self, pieces: &[(Range<usize>, usize)], out: &mut Vec<Range<usize>>) {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0usize;

        for (piece, len) in pieces {
            if total + len > size && !window.is_empty() {
                out.push(window_range(&window));
                while total > overlap || (total + len > size && total > 0) {
                    match window.pop_front() {
                        Some((_, popped)) => total -= popped,
                        None => break,
                    }
                }
            }
            window.push_back((piece.clone(), *len));
            total += len;
        }

        if !window.is_empty() {
            out.push(window_range(&window));
        }
    }
}

/// Split documents with the given size and overlap.
pub fn split(documents: &[Document], chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    let chunker = Chunker::new(ChunkConfig {
        chunk_size,
        chunk_overlap: overlap,
    })?;
    Ok(chunker.split(documents))
}

/// Rebuild the original text from consecutive chunks of one document.
pub fn reconstruct(chunks: &[Chunk]) -> String {
    chunks.iter().map(Chunk::novel_text).collect()
}

fn window_range(window: &VecDeque<(Range<usize>, usize)>) -> Range<usize> {
    let start = window.front().map(|(r, _)| r.start).unwrap_or(0);
    let end = window.back().map(|(r, _)| r.end).unwrap_or(start);
    start..end
}

/// First separator present in `segment`, plus the finer separators after it.
fn pick_separator<'a, 'b>(segment: &str, separators: &'a [&'b str]) -> (&'b str, &'a [&'b str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            return (sep, &[]);
        }
        if segment.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    (separators.last().copied().unwrap_or(""), &[])
}

/// Byte ranges of `segment` cut before every occurrence of `separator`.
///
/// An empty separator cuts between characters.
fn split_keeping_separator(segment: &str, separator: &str) -> Vec<Range<usize>> {
    if separator.is_empty() {
        return segment
            .char_indices()
            .map(|(i, c)| i..i + c.len_utf8())
            .collect();
    }

    let mut pieces = Vec::new();
    let mut prev = 0usize;
    for (start, _) in segment.match_indices(separator) {
        if start > prev {
            pieces.push(prev..start);
            prev = start;
        }
    }
    if prev < segment.len() {
        pieces.push(prev..segment.len());
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(ChunkConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        })
        .unwrap()
    }

    fn sample_text() -> String {
        (0..40)
            .map(|i| {
                format!(
                    "Paragraph {} talks about the message bus and its dispatcher.\nIt has a second line number {}.",
                    i, i
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[test]
    fn test_empty_input() {
        assert!(chunker(100, 10).split(&[]).is_empty());
        let doc = Document::new("empty.md", "", DocumentKind::Text);
        assert!(chunker(100, 10).split_document(&doc).is_empty());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let doc = Document::new("a.md", "Hello, world!", DocumentKind::Text);
        let chunks = chunker(100, 10).split_document(&doc);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello, world!");
        assert_eq!(chunks[0].overlap_with_predecessor, 0);
        assert_eq!(chunks[0].parent_source_uri, "a.md");
    }

    #[test]
    fn test_invalid_config() {
        assert!(Chunker::new(ChunkConfig { chunk_size: 10, chunk_overlap: 10 }).is_err());
        assert!(Chunker::new(ChunkConfig { chunk_size: 0, chunk_overlap: 0 }).is_err());
        assert!(split(&[], 10, 20).is_err());
    }

    #[test]
    fn test_bounds_and_reconstruction() {
        let text = sample_text();
        let doc = Document::new("bus.md", text.clone(), DocumentKind::Text);
        let c = chunker(200, 50);
        let chunks = c.split_document(&doc);

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert!(chunk.text.chars().count() <= 200, "chunk {} too long", i);
            assert!(chunk.overlap_with_predecessor <= 50);
        }
        assert!(chunks.iter().skip(1).any(|c| c.overlap_with_predecessor > 0));
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let para_a = "a".repeat(60);
        let para_b = "b".repeat(60);
        let text = format!("{}\n\n{}", para_a, para_b);
        let chunks = chunker(100, 0).split_text("p.md", &text, TEXT_SEPARATORS);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, para_a);
        assert_eq!(chunks[1].text, format!("\n\n{}", para_b));
    }

    #[test]
    fn test_falls_back_to_characters() {
        let text = "x".repeat(25);
        let chunks = chunker(10, 0).split_text("x.txt", &text, TEXT_SEPARATORS);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text.len(), 10);
        assert_eq!(chunks[2].text.len(), 5);
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_code_splits_at_declarations() {
        let body = "    x += 1;\n".repeat(4);
        let text = format!(
            "#include <cstdio>\nvoid start() {{\n{}}}\nvoid stop() {{\n{}}}\nint count() {{\n{}}}\n",
            body, body, body
        );
        let doc = Document::new("mw.cpp", text.clone(), DocumentKind::Code);
        let chunks = chunker(80, 0).split_document(&doc);

        assert!(chunks.len() >= 3);
        assert!(chunks.iter().any(|c| c.text.starts_with("\nvoid stop()")));
        assert!(chunks.iter().any(|c| c.text.starts_with("\nint count()")));
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_rechunking_a_chunk_is_stable() {
        let text = sample_text();
        let c = chunker(200, 50);
        let chunks = c.split_text("bus.md", &text, TEXT_SEPARATORS);
        for chunk in &chunks {
            let again = c.split_text("bus.md", &chunk.text, TEXT_SEPARATORS);
            assert_eq!(again.len(), 1);
            assert_eq!(again[0].text, chunk.text);
        }
    }

    #[test]
    fn test_multibyte_text() {
        let text = "┌──────────┐\n│ Grüße dir │\n└──────────┘\n".repeat(10);
        let chunks = chunker(30, 8).split_text("box.txt", &text, TEXT_SEPARATORS);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 30);
        }
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_documents_keep_order() {
        let docs = vec![
            Document::new("first.md", "alpha beta", DocumentKind::Text),
            Document::new("second.md", "gamma delta", DocumentKind::Text),
        ];
        let chunks = split(&docs, 100, 10).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].parent_source_uri, "first.md");
        assert_eq!(chunks[1].parent_source_uri, "second.md");
    }

    #[test]
    fn test_web_separator_prefers_sentences() {
        let text = format!("{}. {}", "a".repeat(40), "b".repeat(40));
        let chunks = chunker(50, 0).split_text("https://x", &text, WEB_SEPARATORS);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].text.starts_with(". "));
    }
}
