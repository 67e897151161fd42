//! On-disk layout of a saved index directory:
//!
//! - `manifest.json`: dimension, metric, entry count, next id, save time
//! - `vectors.bin`: little-endian `f32` embeddings, `count * dim` values
//! - `chunks.json`: one record per entry (id, content hash, chunk), same order
//!
//! The layout is a process-local cache, not a compatibility surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use docqa_core::config::Metric;
use docqa_core::error::{Error, Result};
use docqa_core::types::Chunk;

use crate::index::{content_hash, Entry, EntryId, VectorIndex};

const MANIFEST: &str = "manifest.json";
const VECTORS: &str = "vectors.bin";
const CHUNKS: &str = "chunks.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub dim: usize,
    pub metric: Metric,
    pub count: usize,
    pub next_id: EntryId,
    pub saved_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct ChunkRecord {
    id: EntryId,
    content_hash: String,
    chunk: Chunk,
}

impl VectorIndex {
    /// True when `dir` looks like a saved index.
    pub fn exists(dir: &Path) -> bool {
        dir.join(MANIFEST).is_file()
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let mut blob = Vec::with_capacity(self.entries.len() * self.dim * 4);
        for entry in &self.entries {
            for value in &entry.embedding {
                blob.extend_from_slice(&value.to_le_bytes());
            }
        }
        let records: Vec<ChunkRecord> = self
            .entries
            .iter()
            .map(|e| ChunkRecord { id: e.id, content_hash: e.content_hash.clone(), chunk: e.chunk.clone() })
            .collect();
        let manifest = Manifest {
            dim: self.dim,
            metric: self.metric,
            count: self.entries.len(),
            next_id: self.next_id,
            saved_at: Utc::now(),
        };

        fs::write(dir.join(VECTORS), blob)?;
        fs::write(dir.join(CHUNKS), serde_json::to_vec(&records)?)?;
        // Manifest last: a directory without one is never treated as an index.
        fs::write(dir.join(MANIFEST), serde_json::to_vec_pretty(&manifest)?)?;
        tracing::info!(dir = %dir.display(), entries = manifest.count, "saved vector index");
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        if !Self::exists(dir) {
            return Err(Error::NotFound(format!("vector index at {}", dir.display())));
        }
        let manifest: Manifest = serde_json::from_slice(&fs::read(dir.join(MANIFEST))?)
            .map_err(|e| corrupt(dir, format!("manifest: {e}")))?;
        let blob = fs::read(dir.join(VECTORS)).map_err(|e| corrupt(dir, format!("vectors: {e}")))?;
        let records: Vec<ChunkRecord> = serde_json::from_slice(
            &fs::read(dir.join(CHUNKS)).map_err(|e| corrupt(dir, format!("chunks: {e}")))?,
        )
        .map_err(|e| corrupt(dir, format!("chunks: {e}")))?;

        if records.len() != manifest.count {
            return Err(corrupt(dir, format!("{} chunk records for {} entries", records.len(), manifest.count)));
        }
        let row_bytes = manifest
            .dim
            .checked_mul(4)
            .ok_or_else(|| corrupt(dir, format!("dimension {} overflows", manifest.dim)))?;
        let expected_bytes = manifest
            .count
            .checked_mul(row_bytes)
            .ok_or_else(|| corrupt(dir, format!("{} entries of dimension {} overflow", manifest.count, manifest.dim)))?;
        if blob.len() != expected_bytes {
            return Err(corrupt(dir, format!("vector blob has {} bytes, expected {}", blob.len(), expected_bytes)));
        }

        let mut index = VectorIndex::new(manifest.dim, manifest.metric);
        let mut ids = HashSet::with_capacity(records.len());
        for (pos, record) in records.into_iter().enumerate() {
            if record.id >= manifest.next_id || !ids.insert(record.id) {
                return Err(corrupt(dir, format!("invalid or duplicate entry id {}", record.id)));
            }
            if content_hash(&record.chunk) != record.content_hash {
                return Err(corrupt(dir, format!("content hash mismatch for entry {}", record.id)));
            }
            let row = &blob[pos * row_bytes..(pos + 1) * row_bytes];
            let embedding = row
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            if !index.hashes.insert(record.content_hash.clone()) {
                return Err(corrupt(dir, format!("duplicate content for entry {}", record.id)));
            }
            index.entries.push(Entry { id: record.id, embedding, chunk: record.chunk, content_hash: record.content_hash });
        }
        index.next_id = manifest.next_id;
        tracing::info!(dir = %dir.display(), entries = index.len(), saved_at = %manifest.saved_at, "loaded vector index");
        Ok(index)
    }
}

fn corrupt(dir: &Path, detail: String) -> Error {
    Error::IndexCorruption(format!("{}: {}", dir.display(), detail))
}
