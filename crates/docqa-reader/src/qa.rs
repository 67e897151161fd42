//! XLM-RoBERTa encoder with a linear start/end head (`qa_outputs`), the
//! layout of SQuAD2-style multilingual QA checkpoints.

use anyhow::{anyhow, Result};
use candle_core::{Device, IndexOp, Module, Tensor};
use candle_nn::Linear;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use std::path::Path;
use tokenizers::{Tokenizer, TruncationParams, TruncationStrategy};

use docqa_core::error::Error;
use docqa_embed::{device, weights};

use crate::model::{SpanLogits, SpanModel};

pub struct XlmRobertaQa {
    encoder: XLMRobertaModel,
    qa_outputs: Linear,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
}

impl XlmRobertaQa {
    /// Load from a model directory; `max_sequence_length` bounds the joint
    /// (question, context) encoding, special tokens included.
    pub fn load(model_dir: &Path, max_sequence_length: usize) -> docqa_core::Result<Self> {
        Self::load_inner(model_dir, max_sequence_length).map_err(|e| Error::NotFound(format!("reader model: {e:#}")))
    }

    fn load_inner(model_dir: &Path, max_sequence_length: usize) -> Result<Self> {
        let device = device::select_device();
        tracing::info!(dir = %model_dir.display(), "loading reader model");

        let config_json = weights::read_config_json(model_dir)?;
        let config: XLMRobertaConfig = serde_json::from_str(&config_json)?;
        let raw: serde_json::Value = serde_json::from_str(&config_json)?;
        let hidden_size = raw.get("hidden_size").and_then(serde_json::Value::as_u64).ok_or_else(|| anyhow!("config.json has no hidden_size"))? as usize;
        let max_positions = raw.get("max_position_embeddings").and_then(serde_json::Value::as_u64).unwrap_or(514) as usize;
        let max_len = max_sequence_length.min(max_positions.saturating_sub(2));

        let mut tokenizer = weights::load_tokenizer(model_dir)?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_len,
                strategy: TruncationStrategy::OnlySecond,
                stride: 0,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("invalid truncation settings: {}", e))?;

        let tensors = weights::load_tensors(model_dir, &device)?;
        let prefixed = weights::has_roberta_prefix(&tensors);
        let vb = weights::var_builder(tensors, &device);
        let qa_outputs = candle_nn::linear(hidden_size, 2, vb.pp("qa_outputs"))?;
        let encoder = XLMRobertaModel::new(&config, if prefixed { vb.pp("roberta") } else { vb })?;
        tracing::info!(max_len, "reader model loaded");
        Ok(Self { encoder, qa_outputs, tokenizer, device, max_len })
    }

    pub fn max_len(&self) -> usize { self.max_len }

    fn predict_inner(&self, question: &str, context: &str) -> Result<SpanLogits> {
        let enc = self
            .tokenizer
            .encode((question, context), true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let ids = enc.get_ids().to_vec();
        let input_ids = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(enc.get_attention_mask(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden = self.encoder.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let logits = self.qa_outputs.forward(&hidden)?;
        let start = logits.i((0, .., 0))?.to_vec1::<f32>()?;
        let end = logits.i((0, .., 1))?.to_vec1::<f32>()?;
        Ok(SpanLogits { input_ids: ids, start, end })
    }
}

impl SpanModel for XlmRobertaQa {
    fn predict(&self, question: &str, context: &str) -> docqa_core::Result<SpanLogits> {
        self.predict_inner(question, context).map_err(Error::inference)
    }

    fn decode(&self, ids: &[u32]) -> docqa_core::Result<String> {
        self.tokenizer.decode(ids, false).map_err(Error::inference)
    }
}
