//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur during I/O operations
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file format: {format}")]
    InvalidFormat { format: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Write error: {message}")]
    WriteError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IoError> for assemview_core::Error {
    fn from(err: IoError) -> Self {
        match err {
            IoError::FileNotFound { path } => assemview_core::Error::NotFound(path),
            IoError::InvalidFormat { format } => assemview_core::Error::UnsupportedFormat(format),
            IoError::ParseError { message } | IoError::WriteError { message } => {
                assemview_core::Error::InvalidData(message)
            }
            IoError::Io(e) => assemview_core::Error::Io(e),
        }
    }
}
