use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid metadata database '{path}': {message}")]
    Database { path: PathBuf, message: String },

    #[error("metadata error: {0}")]
    Metadata(String),
}
