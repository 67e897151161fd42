//! docqa-core
//!
//! Domain types, error taxonomy, configuration, the `Embedder` seam, the
//! recursive chunker and a plain-text document loader.

pub mod chunker;
pub mod config;
pub mod error;
pub mod loader;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use types::{CandidateAnswer, Chunk, Document, RankedAnswer, NO_ANSWER};
