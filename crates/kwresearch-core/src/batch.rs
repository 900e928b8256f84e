//! Partitioning keyword lists into request-sized batches.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;

use crate::error::{Error, Result};

/// Maximum number of seed keywords sent in one request.
///
/// Zero is rejected at construction so a batch loop can never stall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct BatchSize(NonZeroUsize);

impl BatchSize {
    pub const DEFAULT: usize = 20;

    pub fn new(size: usize) -> Result<Self> {
        NonZeroUsize::new(size)
            .map(Self)
            .ok_or(Error::InvalidBatchSize(size))
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }

    /// Number of batches needed for `len` keywords.
    #[must_use]
    pub const fn batch_count(self, len: usize) -> usize {
        len.div_ceil(self.0.get())
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(NonZeroUsize::MIN.saturating_add(Self::DEFAULT - 1))
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for BatchSize {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self> {
        Self::new(value)
    }
}

impl From<BatchSize> for usize {
    fn from(size: BatchSize) -> Self {
        size.get()
    }
}

/// Split `keywords` into consecutive batches of at most `size`, preserving
/// order. The last batch may be shorter.
pub fn partition<T>(keywords: &[T], size: BatchSize) -> std::slice::Chunks<'_, T> {
    keywords.chunks(size.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("kw{i}")).collect()
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(matches!(BatchSize::new(0), Err(Error::InvalidBatchSize(0))));
    }

    #[test]
    fn test_default_batch_size() {
        assert_eq!(BatchSize::default().get(), 20);
    }

    #[test]
    fn test_partition_reconstructs_input() {
        for len in [1, 2, 19, 20, 21, 57, 100] {
            for size in [1, 3, 20, 150] {
                let input = words(len);
                let size = BatchSize::new(size).unwrap();
                let batches: Vec<&[String]> = partition(&input, size).collect();

                assert_eq!(batches.len(), size.batch_count(len));
                assert_eq!(batches.len(), len.div_ceil(size.get()));
                assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= size.get()));
                assert_eq!(batches.concat(), input);
            }
        }
    }

    #[test]
    fn test_partition_last_batch_smaller() {
        let input = words(45);
        let batches: Vec<&[String]> = partition(&input, BatchSize::default()).collect();
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
    }

    #[test]
    fn test_partition_empty() {
        let input: Vec<String> = Vec::new();
        assert_eq!(partition(&input, BatchSize::default()).count(), 0);
        assert_eq!(BatchSize::default().batch_count(0), 0);
    }

    #[test]
    fn test_batch_size_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<BatchSize>("0").is_err());
        let size: BatchSize = serde_json::from_str("7").unwrap();
        assert_eq!(size.get(), 7);
    }
}
