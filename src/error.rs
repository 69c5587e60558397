//! Error types for sqltpl

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while expanding a SQL template
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read template file: {path}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid parameter shape: {message}")]
    InvalidParams { message: String },
}
