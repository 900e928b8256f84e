use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("not found: {entity} at {}", path.display())]
    NotFound { entity: &'static str, path: PathBuf },

    #[error("no keywords found in {}", path.display())]
    EmptyInput { path: PathBuf },

    #[error("batch size must be a positive integer, got {0}")]
    InvalidBatchSize(usize),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
