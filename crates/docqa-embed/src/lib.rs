//! docqa-embed
//!
//! Sentence embedders implementing `docqa_core::traits::Embedder`:
//! an XLM-RoBERTa encoder run with candle (multilingual-e5 layout) and a
//! deterministic hashing embedder for tests and development.
//!
//! Model weights and tokenizer helpers are shared with `docqa-reader`.

pub mod device;
pub mod pool;
pub mod tokenize;
pub mod weights;

use anyhow::anyhow;
use std::path::Path;
use std::time::Instant;

use candle_core::{DType, Device};
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use docqa_core::error::{Error, Result};
pub use docqa_core::traits::Embedder;

pub use pool::masked_mean_l2;

/// Dimension of [`FakeEmbedder`] vectors returned by [`get_default_embedder`].
pub const FAKE_DIM: usize = 768;
const DEFAULT_MAX_LEN: usize = 512;

pub struct XlmRobertaEmbedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
}

impl XlmRobertaEmbedder {
    pub fn load(model_dir: &Path) -> Result<Self> {
        Self::load_inner(model_dir).map_err(|e| Error::NotFound(format!("embedding model: {e:#}")))
    }

    fn load_inner(model_dir: &Path) -> anyhow::Result<Self> {
        let device = device::select_device();
        tracing::info!(dir = %model_dir.display(), "loading embedding model");
        let tokenizer = weights::load_tokenizer(model_dir)?;
        let config_json = weights::read_config_json(model_dir)?;
        let config: XLMRobertaConfig = serde_json::from_str(&config_json)?;
        let raw: serde_json::Value = serde_json::from_str(&config_json)?;
        let dim = raw.get("hidden_size").and_then(serde_json::Value::as_u64).ok_or_else(|| anyhow!("config.json has no hidden_size"))? as usize;
        let max_positions = raw.get("max_position_embeddings").and_then(serde_json::Value::as_u64).unwrap_or(514) as usize;
        // Two positions are reserved for the padding offset.
        let max_len = DEFAULT_MAX_LEN.min(max_positions.saturating_sub(2)).max(1);

        let tensors = weights::load_tensors(model_dir, &device)?;
        let prefixed = weights::has_roberta_prefix(&tensors);
        let vb = weights::var_builder(tensors, &device);
        let vb = if prefixed { vb.pp("roberta") } else { vb };
        let model = XLMRobertaModel::new(&config, vb)?;
        tracing::info!(dim, max_len, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len })
    }

    fn embed_inner(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize::tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_dtype(DType::F32)?.to_vec2()?;
        if vectors.iter().any(|v| v.len() != self.dim) {
            return Err(anyhow!("model produced vectors of unexpected size (expected {})", self.dim));
        }
        tracing::debug!(batch = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(vectors)
    }
}

impl Embedder for XlmRobertaEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        self.embed_inner(texts).map_err(Error::inference)
    }
}

/// Hashes whitespace tokens into a fixed number of buckets and L2-normalises.
///
/// Texts sharing words land close together, which is enough for retrieval
/// tests without a model download.
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if token.is_empty() { continue; }
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += 0.5 + val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { DEFAULT_MAX_LEN }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// `FakeEmbedder` when `APP_USE_FAKE_EMBEDDINGS` is set, otherwise the
/// XLM-RoBERTa model found via `model_dir`, `APP_EMBEDDER_DIR` or `models/multilingual-e5-base`.
pub fn get_default_embedder(model_dir: Option<&Path>) -> Result<Box<dyn Embedder>> {
    if use_fake_embeddings() {
        tracing::info!("using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(FAKE_DIM)));
    }
    let dir = weights::resolve_model_dir(model_dir, "APP_EMBEDDER_DIR", &["models/multilingual-e5-base", "../models/multilingual-e5-base"])?;
    Ok(Box::new(XlmRobertaEmbedder::load(&dir)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

    #[test]
    fn fake_embedder_prefers_shared_words() {
        let e = FakeEmbedder::new(64);
        let v = e.embed_batch(&["capital of France".into(), "France capital city".into(), "banana bread recipe".into()]).unwrap();
        assert!(cosine(&v[0], &v[1]) > cosine(&v[0], &v[2]));
    }

    #[test]
    fn fake_embedder_ignores_case_and_punctuation() {
        let e = FakeEmbedder::new(32);
        let a = e.embed_one("Paris.").unwrap();
        let b = e.embed_one("paris").unwrap();
        for (x, y) in a.iter().zip(&b) { assert!((x - y).abs() < 1e-6); }
    }

    #[test]
    fn empty_text_still_has_dimension() {
        let e = FakeEmbedder::new(16);
        assert_eq!(e.embed_one("").unwrap().len(), 16);
    }
}
