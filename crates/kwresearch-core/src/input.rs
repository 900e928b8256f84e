use std::path::Path;

use crate::error::{Error, Result};

/// Read seed keywords from a text file, one per line.
///
/// Lines are trimmed and blank lines skipped. A missing file or a file with
/// no keywords is an error: there is nothing to run against.
pub fn read_keywords(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(Error::NotFound {
            entity: "keyword file",
            path: path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(path)?;
    let keywords: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if keywords.is_empty() {
        return Err(Error::EmptyInput {
            path: path.to_path_buf(),
        });
    }

    log::debug!("Read {} keywords from {}", keywords.len(), path.display());
    Ok(keywords)
}
