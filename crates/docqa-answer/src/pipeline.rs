//! Long-lived handle owning the loaded models and the current index snapshot.

use parking_lot::{Mutex, MutexGuard, RwLock};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use docqa_core::chunker::Chunker;
use docqa_core::config::PipelineConfig;
use docqa_core::error::{Error, Result};
use docqa_core::traits::Embedder;
use docqa_core::types::{Document, RankedAnswer};
use docqa_reader::SpanExtractor;
use docqa_vector::{BuildOptions, VectorIndex};

use crate::ranker::rank;

pub struct Resources {
    config: PipelineConfig,
    embedder: Arc<dyn Embedder>,
    extractor: Arc<SpanExtractor>,
    index: RwLock<Arc<VectorIndex>>,
    generation: AtomicU64,
    // Held for every swap, and across read-merge-swap in ingest.
    writer: Mutex<()>,
    show_progress: bool,
}

impl Resources {
    pub fn new(config: PipelineConfig, embedder: Arc<dyn Embedder>, extractor: Arc<SpanExtractor>, index: VectorIndex) -> Result<Self> {
        config.validate()?;
        check_compatible(&index, embedder.as_ref())?;
        Ok(Self {
            config,
            embedder,
            extractor,
            index: RwLock::new(Arc::new(index)),
            generation: AtomicU64::new(0),
            writer: Mutex::new(()),
            show_progress: false,
        })
    }

    /// Show a progress bar while ingest embeds chunks.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Snapshot of the current index. Later swaps do not affect it.
    pub fn index(&self) -> Arc<VectorIndex> {
        self.index.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replace the current index, returning the previous snapshot.
    pub fn swap_index(&self, new: VectorIndex) -> Result<Arc<VectorIndex>> {
        let writer = self.writer.lock();
        self.swap_locked(&writer, new)
    }

    /// Swap under an already held writer guard.
    fn swap_locked(&self, _writer: &MutexGuard<'_, ()>, new: VectorIndex) -> Result<Arc<VectorIndex>> {
        check_compatible(&new, self.embedder.as_ref())?;
        let old = std::mem::replace(&mut *self.index.write(), Arc::new(new));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(generation, "swapped index snapshot");
        Ok(old)
    }

    /// Chunk and embed `documents`, merge them onto the current snapshot and
    /// swap the result in. Returns the number of new entries.
    pub fn ingest(&self, documents: &[Document]) -> Result<usize> {
        let writer = self.writer.lock();
        let chunks = Chunker::new(self.config.chunk_size, self.config.chunk_overlap)?.split_documents(documents);
        let options = BuildOptions {
            metric: self.config.metric,
            batch_size: self.config.embed_batch_size,
            show_progress: self.show_progress,
        };
        let fresh = VectorIndex::build(&chunks, self.embedder.as_ref(), options)?;

        let mut next = (*self.index()).clone();
        let added = next.merge(&fresh)?;
        self.swap_locked(&writer, next)?;
        tracing::info!(documents = documents.len(), chunks = chunks.len(), added, "ingested documents");
        Ok(added)
    }

    /// Load the index saved at `dir` and make it current.
    pub fn reload_index(&self, dir: &Path) -> Result<()> {
        let loaded = VectorIndex::load(dir)?;
        let writer = self.writer.lock();
        self.swap_locked(&writer, loaded)?;
        Ok(())
    }

    /// Drop every indexed chunk.
    pub fn invalidate(&self) -> Result<()> {
        let writer = self.writer.lock();
        let empty = self.index().empty_like();
        let old = self.swap_locked(&writer, empty)?;
        tracing::info!(dropped = old.len(), "invalidated index");
        Ok(())
    }

    /// Retrieve `k` chunks for `question` and rank their spans.
    ///
    /// A blank question, or an empty index, yields the no-answer result.
    pub fn ask(&self, question: &str) -> Result<RankedAnswer> {
        let question = question.trim();
        if question.is_empty() {
            tracing::debug!("blank question");
            return Ok(RankedAnswer::no_answer());
        }
        let snapshot = self.index();
        let chunks = snapshot.query(question, self.embedder.as_ref(), self.config.k)?;
        tracing::debug!(retrieved = chunks.len(), generation = self.generation(), "retrieved chunks");
        Ok(rank(question, &chunks, &self.extractor))
    }
}

fn check_compatible(index: &VectorIndex, embedder: &dyn Embedder) -> Result<()> {
    if index.dim() != embedder.dim() {
        return Err(Error::InvalidConfig(format!(
            "index dimension {} does not match embedder dimension {}",
            index.dim(),
            embedder.dim()
        )));
    }
    Ok(())
}
