use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::competition::CompetitionLevel;

/// Search-volume and competition metrics for one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMetrics {
    pub keyword: String,

    /// Average monthly searches over the trailing twelve months.
    pub avg_monthly_searches: u64,

    pub competition: CompetitionLevel,

    /// Platform-defined competition index; passed through unvalidated.
    pub competition_index: i64,
}

impl KeywordMetrics {
    #[must_use]
    pub fn new(
        keyword: impl Into<String>,
        avg_monthly_searches: u64,
        competition: CompetitionLevel,
        competition_index: i64,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            avg_monthly_searches,
            competition,
            competition_index,
        }
    }
}

/// Results of a run, keyed by keyword text.
///
/// A later record for the same keyword replaces the earlier one.
pub type MetricsMap = BTreeMap<String, KeywordMetrics>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_entry_overwrites() {
        let mut map = MetricsMap::new();
        let first = KeywordMetrics::new("shoe", 10, CompetitionLevel::Low, 5);
        let second = KeywordMetrics::new("shoe", 1000, CompetitionLevel::High, 90);
        map.insert(first.keyword.clone(), first);
        map.insert(second.keyword.clone(), second);

        assert_eq!(map.len(), 1);
        assert_eq!(map["shoe"].avg_monthly_searches, 1000);
        assert_eq!(map["shoe"].competition, CompetitionLevel::High);
    }
}
