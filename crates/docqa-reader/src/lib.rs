//! docqa-reader
//!
//! Extractive question answering over single chunks: a span model trait, the
//! XLM-RoBERTa QA implementation, language detection and the filtering
//! [`SpanExtractor`].

pub mod extractor;
pub mod fake;
pub mod language;
pub mod model;
pub mod qa;

use std::path::Path;
use std::sync::Arc;

use docqa_core::config::PipelineConfig;
use docqa_core::error::Result;
use docqa_embed::weights;

pub use extractor::SpanExtractor;
pub use fake::FakeSpanModel;
pub use language::LanguageCheck;
pub use model::{SpanLogits, SpanModel};
pub use qa::XlmRobertaQa;

/// Load the QA model found via `model_dir`, `APP_READER_DIR` or
/// `models/xlm-roberta-base-squad2`, wrapped in an extractor configured from `config`.
pub fn get_default_reader(model_dir: Option<&Path>, config: &PipelineConfig) -> Result<SpanExtractor> {
    let dir = weights::resolve_model_dir(model_dir, "APP_READER_DIR", &["models/xlm-roberta-base-squad2", "../models/xlm-roberta-base-squad2"])?;
    let model = XlmRobertaQa::load(&dir, config.max_sequence_length)?;
    SpanExtractor::from_config(Arc::new(model), config)
}
