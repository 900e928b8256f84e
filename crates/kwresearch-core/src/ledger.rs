//! Append-only record of keywords whose batch failed.
//!
//! Each failed batch appends every one of its keywords, one per line. The
//! file is never truncated or deduplicated, so it can be fed straight back
//! in as the keyword input for a retry run.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const DEFAULT_LEDGER_FILE: &str = "failed_keywords.txt";

#[derive(Debug, Clone)]
pub struct FailureLedger {
    path: PathBuf,
}

impl FailureLedger {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append every keyword in `batch`, creating the file if needed.
    pub fn record<S: AsRef<str>>(&self, batch: &[S]) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        for keyword in batch {
            writeln!(writer, "{}", keyword.as_ref())?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Default for FailureLedger {
    fn default() -> Self {
        Self::new(DEFAULT_LEDGER_FILE)
    }
}
