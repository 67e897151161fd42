use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Model inference failed: {0}")]
    ModelInference(String),

    #[error("Index corrupted: {0}")]
    IndexCorruption(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap any displayable model-side failure (tokenizer, tensor op, ...).
    pub fn inference(err: impl std::fmt::Display) -> Self {
        Self::ModelInference(err.to_string())
    }

    /// Per-chunk failures that ranking recovers from instead of surfacing.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ModelInference(_) | Self::Input(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
