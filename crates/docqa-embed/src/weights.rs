//! Locating and loading Hugging Face style model directories
//! (`tokenizer.json`, `config.json`, `model.safetensors` or `pytorch_model.bin`).

use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use docqa_core::error::Error;

/// Resolve a model directory from, in order: the explicit path, the
/// environment variable `env_key`, then each of `fallbacks` that exists.
pub fn resolve_model_dir(explicit: Option<&Path>, env_key: &str, fallbacks: &[&str]) -> docqa_core::Result<PathBuf> {
    if let Some(p) = explicit {
        if p.exists() { return Ok(p.to_path_buf()); }
        return Err(Error::NotFound(format!("model directory {}", p.display())));
    }
    if let Ok(dir) = std::env::var(env_key) {
        let p = PathBuf::from(&dir);
        if p.exists() { tracing::info!("using {}: {}", env_key, p.display()); return Ok(p); }
    }
    for candidate in fallbacks {
        let p = Path::new(candidate);
        if p.exists() { tracing::info!("using model dir: {}", p.display()); return Ok(p.to_path_buf()); }
    }
    Err(Error::NotFound(format!("model directory (set {env_key} or one of {fallbacks:?})")))
}

pub fn load_tokenizer(model_dir: &Path) -> Result<Tokenizer> {
    let tokenizer_path = model_dir.join("tokenizer.json");
    Tokenizer::from_file(&tokenizer_path)
        .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))
}

pub fn read_config_json(model_dir: &Path) -> Result<String> {
    let config_path = model_dir.join("config.json");
    std::fs::read_to_string(&config_path).map_err(|e| anyhow!("Failed to read {}: {}", config_path.display(), e))
}

/// Read every tensor of the checkpoint, preferring safetensors over pickle.
pub fn load_tensors(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        let weights = candle_core::pickle::read_all(&pickle)?;
        return Ok(weights.into_iter().collect());
    }
    Err(anyhow!("no model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}

/// Checkpoints saved from task heads prefix the encoder with `roberta.`;
/// bare encoder checkpoints do not.
pub fn has_roberta_prefix(tensors: &HashMap<String, Tensor>) -> bool {
    tensors.keys().any(|k| k.starts_with("roberta."))
}

pub fn var_builder(tensors: HashMap<String, Tensor>, device: &Device) -> VarBuilder<'static> {
    VarBuilder::from_tensors(tensors, DType::F32, device)
}
