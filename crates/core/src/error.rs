//! Error types for the BPE tokenizer library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the tokenizer library.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// Error during tokenization
    #[error("Tokenization error: {0}")]
    Tokenization(String),

    /// Error during training
    #[error("Training error: {0}")]
    Training(String),

    /// Error loading a model file
    #[error("Load error: {0}")]
    Load(String),

    /// Error saving a model file
    #[error("Save error: {0}")]
    Save(String),

    /// I/O error with file context
    #[error("I/O error for {path}: {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid argument passed by the caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Token ID that is neither a vocabulary entry nor a special token
    #[error("Invalid token ID: {0}")]
    InvalidToken(u32),

    /// A reserved literal was found in text encoded with `none_raise`
    #[error("Special token {0:?} found in text, but special tokens are disallowed")]
    SpecialTokenConflict(String),

    /// External rank table cannot be explained by greedy BPE merges
    #[error("Incompatible rank table: {0}")]
    IncompatibleRankTable(String),

    /// Model file with an unknown format tag
    #[error("Unsupported model format: {0:?}")]
    UnsupportedModelFormat(String),

    /// Invalid merge rule
    #[error("Invalid merge rule: {0}")]
    InvalidMerge(String),

    /// Split pattern failed to compile or to match
    #[error("Pattern error: {0}")]
    Pattern(String),
}

/// Result type alias for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizerError>;
