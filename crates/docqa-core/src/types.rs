//! Domain types shared by the chunker, index, reader and ranker.

use serde::{Deserialize, Serialize};

/// Text shown when every candidate span was filtered out.
pub const NO_ANSWER: &str = "No answer found.";

/// A source document as handed over by a loader.
///
/// `source_id` is a file path, URL or page name. Documents are never mutated
/// after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub raw_text: String,
    pub source_id: String,
}

impl Document {
    pub fn new(raw_text: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self { raw_text: raw_text.into(), source_id: source_id.into() }
    }
}

/// A bounded fragment of exactly one document.
///
/// - `text`: at most `chunk_size` characters
/// - `source_id`: copied from the parent document
/// - `index`: zero-based position within the parent document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_id: String,
    pub index: usize,
}

/// A span proposed by the reader for one (question, chunk) pair.
///
/// `score` is the raw start logit of the span; it only orders candidates and
/// is not a probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAnswer {
    pub text: String,
    pub score: f32,
    pub source_id: String,
}

/// The externally visible result of one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedAnswer {
    pub text: String,
    /// Normalised source names, deduplicated, in ranked order of first appearance.
    pub sources: Vec<String>,
}

impl RankedAnswer {
    pub fn no_answer() -> Self {
        Self { text: NO_ANSWER.to_string(), sources: Vec::new() }
    }

    pub fn is_no_answer(&self) -> bool {
        self.sources.is_empty() && self.text == NO_ANSWER
    }

    /// Sources rendered for display, e.g. `"report, notes"`.
    pub fn sources_line(&self) -> String {
        self.sources.join(", ")
    }
}
