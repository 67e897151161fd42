use docqa_core::error::Result;

/// Per-token start and end scores for one encoded (question, context) pair.
///
/// All three vectors have one element per input token, special tokens
/// included.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanLogits {
    pub input_ids: Vec<u32>,
    pub start: Vec<f32>,
    pub end: Vec<f32>,
}

/// A loaded span-extraction model.
///
/// `predict` must never truncate the question: when the pair does not fit,
/// the context is cut. Implementations are shared read-only between threads.
pub trait SpanModel: Send + Sync {
    fn predict(&self, question: &str, context: &str) -> Result<SpanLogits>;

    /// Turn token ids back into text, special tokens left in place.
    fn decode(&self, ids: &[u32]) -> Result<String>;
}
