//! Error types for assemview

use thiserror::Error;

use crate::tree::TreeItemId;

/// Main error type for assemview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid assembly node '{name}': {reason}")]
    InvalidAssembly { name: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0} is already bound to a scene node")]
    AlreadyBound(TreeItemId),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Visualization error: {0}")]
    Visualization(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for assemview operations
pub type Result<T> = std::result::Result<T, Error>;
