use std::sync::Arc;

use docqa_core::config::PipelineConfig;
use docqa_core::error::{Error, Result};
use docqa_core::types::{CandidateAnswer, Chunk};

use crate::language::LanguageCheck;
use crate::model::SpanModel;

const BOUNDARY_MARKERS: [&str; 6] = ["[CLS]", "[SEP]", "[PAD]", "<s>", "</s>", "<pad>"];

/// Turns (question, chunk) pairs into scored candidate spans.
///
/// Holds the loaded model by `Arc`; `extract` takes `&self` and may be called
/// from several threads at once.
pub struct SpanExtractor {
    model: Arc<dyn SpanModel>,
    min_score: f32,
    language: LanguageCheck,
}

impl SpanExtractor {
    pub fn new(model: Arc<dyn SpanModel>, min_score: f32, language: LanguageCheck) -> Self {
        Self { model, min_score, language }
    }

    pub fn from_config(model: Arc<dyn SpanModel>, config: &PipelineConfig) -> Result<Self> {
        Ok(Self::new(model, config.min_score, LanguageCheck::from_filter(&config.language_filter)?))
    }

    pub fn min_score(&self) -> f32 {
        self.min_score
    }

    /// Best span of `chunk` for `question`, or `None` when it is filtered out.
    pub fn extract(&self, question: &str, chunk: &Chunk) -> Result<Option<CandidateAnswer>> {
        let logits = self.model.predict(question, &chunk.text)?;
        if logits.start.len() != logits.input_ids.len() || logits.end.len() != logits.input_ids.len() {
            return Err(Error::ModelInference(format!(
                "{} tokens but {} start and {} end scores",
                logits.input_ids.len(),
                logits.start.len(),
                logits.end.len()
            )));
        }
        let (start, score) = argmax(&logits.start);
        let (end, _) = argmax(&logits.end);

        let text = match (start, end) {
            (Some(s), Some(e)) if s <= e => {
                let raw = self.model.decode(&logits.input_ids[s..=e])?;
                clean_span(&raw, question)
            }
            _ => String::new(),
        };

        if text.is_empty() {
            tracing::debug!(source = %chunk.source_id, index = chunk.index, "empty span");
            return Ok(None);
        }
        // NaN scores never pass.
        if !(score > self.min_score) {
            tracing::debug!(source = %chunk.source_id, index = chunk.index, score, min_score = self.min_score, "span below threshold");
            return Ok(None);
        }
        let target = self.language.target(question);
        if !self.language.accepts(target, &text) {
            tracing::debug!(source = %chunk.source_id, index = chunk.index, ?target, "span language differs");
            return Ok(None);
        }

        Ok(Some(CandidateAnswer { text, score, source_id: chunk.source_id.clone() }))
    }
}

/// Index and value of the first maximum.
fn argmax(values: &[f32]) -> (Option<usize>, f32) {
    let mut best: Option<usize> = None;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if best.is_none() || v > best_value {
            best = Some(i);
            best_value = v;
        }
    }
    (best, best_value)
}

fn clean_span(raw: &str, question: &str) -> String {
    let mut text = raw.to_string();
    for marker in BOUNDARY_MARKERS {
        text = text.replace(marker, " ");
    }
    let question = question.trim();
    if !question.is_empty() {
        text = text.replace(question, " ");
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
