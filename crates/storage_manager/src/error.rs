//! Storage error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid stored data for '{key}': {reason}")]
    InvalidData { key: String, reason: String },

    #[error("No GitHub token found")]
    TokenNotFound,
}

pub type Result<T> = std::result::Result<T, StorageError>;
