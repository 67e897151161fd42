//! Exact (brute-force) vector index over chunks.
//!
//! Entries live in insertion order; ids are handed out from a monotonically
//! increasing counter and never reused, including across merges.

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use docqa_core::config::Metric;
use docqa_core::error::{Error, Result};
use docqa_core::traits::Embedder;
use docqa_core::types::Chunk;

use crate::distance;

pub type EntryId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Entry {
    pub(crate) id: EntryId,
    pub(crate) embedding: Vec<f32>,
    pub(crate) chunk: Chunk,
    pub(crate) content_hash: String,
}

/// A retrieved chunk. `score` is higher-is-better for both metrics
/// (negated squared distance for L2, similarity for cosine).
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: EntryId,
    pub score: f32,
    pub chunk: Chunk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub entries: usize,
    pub documents: usize,
    pub dim: usize,
    pub metric: Metric,
    pub next_id: EntryId,
}

#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub metric: Metric,
    pub batch_size: usize,
    pub show_progress: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { metric: Metric::L2, batch_size: 32, show_progress: false }
    }
}

#[derive(Debug, Clone)]
pub struct VectorIndex {
    pub(crate) dim: usize,
    pub(crate) metric: Metric,
    pub(crate) entries: Vec<Entry>,
    pub(crate) next_id: EntryId,
    pub(crate) hashes: HashSet<String>,
}

pub(crate) fn content_hash(chunk: &Chunk) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(chunk.source_id.as_bytes());
    hasher.update(&[0]);
    hasher.update(chunk.text.as_bytes());
    hasher.finalize().to_hex().to_string()
}

impl VectorIndex {
    pub fn new(dim: usize, metric: Metric) -> Self {
        Self { dim, metric, entries: Vec::new(), next_id: 0, hashes: HashSet::new() }
    }

    /// Embed every chunk with `embedder` and index it.
    pub fn build(chunks: &[Chunk], embedder: &dyn Embedder, options: BuildOptions) -> Result<Self> {
        let mut index = Self::new(embedder.dim(), options.metric);
        if chunks.is_empty() {
            return Ok(index);
        }
        let batch_size = options.batch_size.max(1);
        let pb = if options.show_progress { ProgressBar::new(chunks.len() as u64) } else { ProgressBar::hidden() };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = embedder.embed_batch(&texts)?;
            index.insert(batch, embeddings)?;
            pb.inc(batch.len() as u64);
        }
        pb.finish_with_message("embedded");
        tracing::info!(chunks = chunks.len(), entries = index.len(), dim = index.dim, "built vector index");
        Ok(index)
    }

    /// Add chunks with their precomputed embeddings. Chunks whose
    /// `(source_id, text)` is already indexed are skipped.
    /// Returns the number of entries added.
    pub fn insert(&mut self, chunks: &[Chunk], embeddings: Vec<Vec<f32>>) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(Error::ModelInference(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dim) {
            return Err(Error::ModelInference(format!("dim mismatch: got {} expected {}", bad.len(), self.dim)));
        }
        let mut added = 0;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            if self.push(chunk.clone(), embedding) {
                added += 1;
            }
        }
        Ok(added)
    }

    fn push(&mut self, chunk: Chunk, embedding: Vec<f32>) -> bool {
        let hash = content_hash(&chunk);
        if !self.hashes.insert(hash.clone()) {
            tracing::debug!(source = %chunk.source_id, index = chunk.index, "skipping already indexed chunk");
            return false;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry { id, embedding, chunk, content_hash: hash });
        true
    }

    /// Append `other`'s entries under fresh ids. Entries already present
    /// here are kept as they are. Returns the number of entries added.
    pub fn merge(&mut self, other: &VectorIndex) -> Result<usize> {
        if other.dim != self.dim || other.metric != self.metric {
            return Err(Error::InvalidConfig(format!(
                "cannot merge index (dim {}, {:?}) into index (dim {}, {:?})",
                other.dim, other.metric, self.dim, self.metric
            )));
        }
        let mut added = 0;
        for entry in &other.entries {
            if self.push(entry.chunk.clone(), entry.embedding.clone()) {
                added += 1;
            }
        }
        tracing::info!(added, total = self.len(), "merged vector index");
        Ok(added)
    }

    /// The `k` entries closest to `query_vec`, best first; ties keep insertion order.
    pub fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<Hit>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query_vec.len() != self.dim {
            return Err(Error::ModelInference(format!(
                "query vector has dim {} but index has dim {}",
                query_vec.len(),
                self.dim
            )));
        }
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, e)| (pos, distance::score(self.metric, query_vec, &e.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        Ok(scored
            .into_iter()
            .map(|(pos, score)| {
                let entry = &self.entries[pos];
                Hit { id: entry.id, score, chunk: entry.chunk.clone() }
            })
            .collect())
    }

    /// Embed `question` and return the `k` nearest chunks.
    pub fn query(&self, question: &str, embedder: &dyn Embedder, k: usize) -> Result<Vec<Chunk>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = embedder.embed_one(question)?;
        Ok(self.search(&query_vec, k)?.into_iter().map(|h| h.chunk).collect())
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn dim(&self) -> usize { self.dim }
    pub fn metric(&self) -> Metric { self.metric }

    /// Distinct source ids in first-indexed order.
    pub fn sources(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|e| seen.insert(e.chunk.source_id.as_str()))
            .map(|e| e.chunk.source_id.clone())
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entries: self.len(),
            documents: self.sources().len(),
            dim: self.dim,
            metric: self.metric,
            next_id: self.next_id,
        }
    }

    /// An empty index with the same dimension and metric.
    pub fn empty_like(&self) -> Self {
        Self::new(self.dim, self.metric)
    }
}

/// Build an index over `chunks`.
pub fn build(chunks: &[Chunk], embedder: &dyn Embedder, options: BuildOptions) -> Result<VectorIndex> {
    VectorIndex::build(chunks, embedder, options)
}

/// The `k` chunks nearest to `question`.
pub fn query(index: &VectorIndex, question: &str, embedder: &dyn Embedder, k: usize) -> Result<Vec<Chunk>> {
    index.query(question, embedder, k)
}

/// A new index holding `a`'s entries followed by `b`'s entries not already in `a`.
pub fn merge(a: &VectorIndex, b: &VectorIndex) -> Result<VectorIndex> {
    let mut merged = a.clone();
    merged.merge(b)?;
    Ok(merged)
}
