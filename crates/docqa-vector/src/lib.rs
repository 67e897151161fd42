//! docqa-vector
//!
//! Exact nearest-neighbour index over chunk embeddings with merge and
//! directory persistence. See `index` for the operations and `store` for the
//! on-disk layout.

pub mod distance;
pub mod index;
pub mod store;

pub use index::{build, merge, query, BuildOptions, EntryId, Hit, IndexStats, VectorIndex};
pub use store::Manifest;
