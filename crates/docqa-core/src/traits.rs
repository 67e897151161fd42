use crate::error::Result;

/// Maps text to fixed-length vectors.
///
/// Implementations must return one vector of length `dim()` per input, in
/// input order. The same instance is used to build an index and to embed
/// questions against it.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| crate::error::Error::ModelInference("embedder returned no vector".into()))
    }
}
