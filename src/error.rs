//! Error types for the langid system

use thiserror::Error;

/// Main error type for langid operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (empty label space, invalid hyperparameters)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or incomplete checkpoint/base-model artifact
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Dataset loading or parsing error
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Tokenizer loading or encoding error
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Tensor operation error
    #[error("Tensor operation error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Other errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for langid operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an artifact error
    pub fn artifact(msg: impl Into<String>) -> Self {
        Self::Artifact(msg.into())
    }

    /// Create a dataset error
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    /// Create a tokenizer error
    pub fn tokenizer(msg: impl Into<String>) -> Self {
        Self::Tokenizer(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
