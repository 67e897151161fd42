//! Word-level stand-in for a QA model, for tests and offline runs.
//!
//! Tokens are whitespace-separated words laid out as
//! `[CLS] question [SEP] context [SEP]`. Start and end logits are zero except
//! on words registered with [`FakeSpanModel::span`], so an unknown context
//! predicts the `[CLS]` position and decodes to nothing.

use parking_lot::Mutex;
use std::collections::HashMap;

use docqa_core::error::{Error, Result};

use crate::model::{SpanLogits, SpanModel};

#[derive(Default)]
struct Vocab {
    ids: HashMap<String, u32>,
    words: Vec<String>,
}

impl Vocab {
    fn intern(&mut self, word: &str) -> u32 {
        if let Some(&id) = self.ids.get(word) {
            return id;
        }
        let id = self.words.len() as u32;
        self.words.push(word.to_string());
        self.ids.insert(word.to_string(), id);
        id
    }
}

struct SpanRule {
    start: String,
    end: String,
    score: f32,
}

pub struct FakeSpanModel {
    max_len: usize,
    rules: Vec<SpanRule>,
    failing: Vec<String>,
    vocab: Mutex<Vocab>,
}

impl FakeSpanModel {
    pub fn new(max_len: usize) -> Self {
        Self { max_len, rules: Vec::new(), failing: Vec::new(), vocab: Mutex::new(Vocab::default()) }
    }

    /// Score `word` as a one-word answer.
    pub fn answer(self, word: &str, score: f32) -> Self {
        self.span(word, word, score)
    }

    /// Score the span starting at `start` and ending at `end`.
    pub fn span(mut self, start: &str, end: &str, score: f32) -> Self {
        self.rules.push(SpanRule { start: normalize(start), end: normalize(end), score });
        self
    }

    /// Fail inference for any context containing `word`.
    pub fn fail_on(mut self, word: &str) -> Self {
        self.failing.push(normalize(word));
        self
    }
}

fn normalize(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()
}

impl SpanModel for FakeSpanModel {
    fn predict(&self, question: &str, context: &str) -> Result<SpanLogits> {
        let question: Vec<&str> = question.split_whitespace().collect();
        let mut context: Vec<&str> = context.split_whitespace().collect();
        if context.iter().any(|w| self.failing.contains(&normalize(w))) {
            return Err(Error::ModelInference("fake model failure".into()));
        }
        let budget = self
            .max_len
            .checked_sub(question.len() + 3)
            .ok_or_else(|| Error::ModelInference(format!("question of {} tokens exceeds {}", question.len(), self.max_len)))?;
        context.truncate(budget);

        let mut tokens = vec!["[CLS]"];
        tokens.extend(&question);
        tokens.push("[SEP]");
        let context_start = tokens.len();
        tokens.extend(&context);
        tokens.push("[SEP]");

        let mut start = vec![0.0f32; tokens.len()];
        let mut end = vec![0.0f32; tokens.len()];
        for (pos, word) in tokens.iter().enumerate().skip(context_start) {
            let word = normalize(word);
            for rule in &self.rules {
                if word == rule.start {
                    start[pos] = start[pos].max(rule.score);
                }
                if word == rule.end {
                    end[pos] = end[pos].max(rule.score);
                }
            }
        }

        let mut vocab = self.vocab.lock();
        let input_ids = tokens.iter().map(|t| vocab.intern(t)).collect();
        Ok(SpanLogits { input_ids, start, end })
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        let vocab = self.vocab.lock();
        let words = ids
            .iter()
            .map(|&id| vocab.words.get(id as usize).map(String::as_str).ok_or_else(|| Error::ModelInference(format!("unknown token id {id}"))))
            .collect::<Result<Vec<_>>>()?;
        Ok(words.join(" "))
    }
}
