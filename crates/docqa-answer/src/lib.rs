//! docqa-answer
//!
//! Aggregates span candidates into a single answer with source attribution,
//! and owns the long-lived [`Resources`] handle used to ingest documents and
//! ask questions.

pub mod pipeline;
pub mod ranker;
pub mod source;

pub use pipeline::Resources;
pub use ranker::{aggregate, rank};
pub use source::{dedup_sources, normalize_source};
