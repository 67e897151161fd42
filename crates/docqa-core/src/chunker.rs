//! Recursive separator chunker.
//!
//! Splits on the first separator present in the text (paragraph break, line
//! break, comma), recurses into pieces that are still too long with the
//! remaining separators, and falls back to fixed-width character windows.
//! Small pieces are merged greedily up to `chunk_size`; the trailing pieces of
//! an emitted chunk (at most `chunk_overlap` characters) open the next one.
//!
//! All sizes are counted in characters, not bytes.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

pub const DEFAULT_SEPARATORS: [&str; 3] = ["\n\n", "\n", ","];

#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

/// Split every document into chunks; `index` restarts at zero per document.
pub fn split(documents: &[Document], chunk_size: usize, chunk_overlap: usize) -> Result<Vec<Chunk>> {
    Ok(Chunker::new(chunk_size, chunk_overlap)?.split_documents(documents))
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| (*s).to_string()).collect(),
        })
    }

    /// Replace the separator priority list. Empty separators are ignored.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).filter(|s: &String| !s.is_empty()).collect();
        self
    }

    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for doc in documents {
            let pieces = self.split_text(&doc.raw_text);
            tracing::debug!(source = %doc.source_id, chunks = pieces.len(), "split document");
            chunks.extend(pieces.into_iter().enumerate().map(|(index, text)| Chunk {
                text,
                source_id: doc.source_id.clone(),
                index,
            }));
        }
        chunks
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        self.split_recursive(text, &separators)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let Some(pos) = separators.iter().position(|sep| text.contains(sep)) else {
            return self.hard_split(text);
        };
        let remaining = &separators[pos + 1..];

        let mut out = Vec::new();
        let mut small: Vec<&str> = Vec::new();
        for piece in split_keep_separator(text, separators[pos]) {
            if char_len(piece) <= self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                out.extend(self.merge(&small));
                small.clear();
            }
            out.extend(self.split_recursive(piece, remaining));
        }
        if !small.is_empty() {
            out.extend(self.merge(&small));
        }
        out
    }

    /// Greedily pack pieces into chunks, carrying a tail of at most
    /// `chunk_overlap` characters into the next chunk.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !current.is_empty() {
                push_trimmed(&mut out, &current);
                while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                    let Some(front) = current.pop_front() else { break };
                    total -= char_len(front);
                }
            }
            current.push_back(piece);
            total += len;
        }
        push_trimmed(&mut out, &current);
        out
    }

    /// Fixed-width character windows stepping by `chunk_size - chunk_overlap`.
    fn hard_split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        let mut out = Vec::new();
        let mut start = 0usize;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            if !window.trim().is_empty() {
                out.push(window);
            }
            if end == chars.len() {
                break;
            }
            start += step;
        }
        out
    }
}

/// Split `text` on `sep`, attaching each separator to the piece that follows it.
fn split_keep_separator<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0usize;
    for (idx, _) in text.match_indices(sep) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn push_trimmed(out: &mut Vec<String>, current: &VecDeque<&str>) {
    let joined: String = current.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Locate each chunk in `text` in order and assert that only whitespace
    /// is left uncovered.
    fn assert_covers(text: &str, chunks: &[String]) {
        let mut covered_to = 0usize;
        let mut search_from = 0usize;
        for chunk in chunks {
            let rel = text[search_from..].find(chunk.as_str()).unwrap_or_else(|| panic!("chunk {chunk:?} not found in order"));
            let start = search_from + rel;
            if start > covered_to {
                assert!(text[covered_to..start].trim().is_empty(), "gap before {chunk:?}");
            }
            covered_to = covered_to.max(start + chunk.len());
            search_from = start + chunk.chars().next().map_or(1, char::len_utf8);
        }
        assert!(text[covered_to..].trim().is_empty(), "uncovered tail");
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(split(&[], 100, 10).unwrap().is_empty());
        let docs = vec![Document::new("   \n\n  ", "blank.txt")];
        assert!(split(&docs, 100, 10).unwrap().is_empty());
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        assert!(matches!(Chunker::new(0, 0), Err(Error::InvalidConfig(_))));
        assert!(matches!(Chunker::new(10, 10), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn short_document_is_one_chunk() {
        let docs = vec![Document::new("Paris is the capital of France.", "a.txt")];
        let chunks = split(&docs, 1000, 150).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Paris is the capital of France.");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].source_id, "a.txt");
    }

    #[test]
    fn paragraphs_are_preferred_over_lines() {
        let text = "first paragraph line one\nline two\n\nsecond paragraph";
        let chunker = Chunker::new(40, 0).unwrap();
        let chunks = chunker.split_text(text);
        assert_eq!(chunks, vec!["first paragraph line one\nline two", "second paragraph"]);
    }

    #[test]
    fn chunks_respect_size_and_cover_text() {
        let text = (0..40).map(|i| format!("sentence number {i} talks about things")).collect::<Vec<_>>().join(", ");
        let chunker = Chunker::new(120, 30).unwrap();
        let chunks = chunker.split_text(&text);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.chars().count() <= 120, "chunk too long: {}", c.chars().count());
        }
        assert_covers(&text, &chunks);
    }

    #[test]
    fn consecutive_chunks_share_carried_pieces() {
        let text = "aaaa,bbbb,cccc,dddd,eeee,ffff,gggg";
        let chunker = Chunker::new(15, 5).unwrap();
        let chunks = chunker.split_text(text);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let last_piece = pair[0].rsplit(',').next().unwrap();
            assert!(pair[1].starts_with(&format!(",{last_piece}")) || pair[1].starts_with(last_piece), "{pair:?}");
        }
        assert_covers(text, &chunks);
    }

    /// Drop the carried prefix of every chunk after the first and concatenate.
    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut out = chunks[0].clone();
        for c in &chunks[1..] {
            out.extend(c.chars().skip(overlap));
        }
        out
    }

    #[test]
    fn hard_split_overlaps_exactly() {
        let text: String = (0..50u32).filter_map(|i| char::from_u32(0x4E00 + i)).collect();
        let chunker = Chunker::new(20, 5).unwrap();
        let chunks = chunker.split_text(&text);
        assert_eq!(chunks.len(), 3);
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().skip(15).collect();
            assert!(pair[1].starts_with(&tail));
        }
        assert_eq!(reconstruct(&chunks, 5), text);
    }

    #[test]
    fn multibyte_text_is_counted_in_chars() {
        let text = "ção".repeat(30);
        let chunker = Chunker::new(25, 5).unwrap();
        let chunks = chunker.split_text(&text);
        assert_eq!(chunks.len(), 5);
        for c in &chunks {
            assert!(c.chars().count() <= 25);
        }
        assert_eq!(reconstruct(&chunks, 5), text);
    }

    #[test]
    fn index_resets_per_document() {
        let long = "one, two, three, four, five, six, seven, eight";
        let docs = vec![Document::new(long, "a.txt"), Document::new(long, "b.txt")];
        let chunks = split(&docs, 16, 0).unwrap();
        let a: Vec<usize> = chunks.iter().filter(|c| c.source_id == "a.txt").map(|c| c.index).collect();
        let b: Vec<usize> = chunks.iter().filter(|c| c.source_id == "b.txt").map(|c| c.index).collect();
        assert_eq!(a, (0..a.len()).collect::<Vec<_>>());
        assert_eq!(a, b);
        assert_eq!(chunks[0].source_id, "a.txt");
    }
}
