use serde::{Deserialize, Serialize};
use std::fmt;

/// How contested advertiser bidding is for a keyword.
///
/// The API reports this as a small integer code (or, over REST, as the
/// enum name). Anything outside the known set collapses to
/// [`CompetitionLevel::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetitionLevel {
    Unspecified,
    Unknown,
    Low,
    Medium,
    High,
}

impl CompetitionLevel {
    /// Translate a wire code: 0 UNSPECIFIED, 1 UNKNOWN, 2 LOW, 3 MEDIUM,
    /// 4 HIGH.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Unspecified,
            2 => Self::Low,
            3 => Self::Medium,
            4 => Self::High,
            _ => Self::Unknown,
        }
    }

    /// Translate an enum name as it appears in REST/JSON responses.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "UNSPECIFIED" => Self::Unspecified,
            "LOW" => Self::Low,
            "MEDIUM" => Self::Medium,
            "HIGH" => Self::High,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Unspecified => 0,
            Self::Unknown => 1,
            Self::Low => 2,
            Self::Medium => 3,
            Self::High => 4,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Unknown => "UNKNOWN",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for CompetitionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(CompetitionLevel::from_code(0), CompetitionLevel::Unspecified);
        assert_eq!(CompetitionLevel::from_code(1), CompetitionLevel::Unknown);
        assert_eq!(CompetitionLevel::from_code(2), CompetitionLevel::Low);
        assert_eq!(CompetitionLevel::from_code(3), CompetitionLevel::Medium);
        assert_eq!(CompetitionLevel::from_code(4), CompetitionLevel::High);
    }

    #[test]
    fn test_unrecognized_code_is_unknown() {
        for code in [-1, 5, 42, i64::MAX] {
            assert_eq!(CompetitionLevel::from_code(code), CompetitionLevel::Unknown);
        }
    }

    #[test]
    fn test_code_round_trips_through_table() {
        for level in [
            CompetitionLevel::Unspecified,
            CompetitionLevel::Unknown,
            CompetitionLevel::Low,
            CompetitionLevel::Medium,
            CompetitionLevel::High,
        ] {
            assert_eq!(CompetitionLevel::from_code(level.code()), level);
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(CompetitionLevel::from_name("LOW"), CompetitionLevel::Low);
        assert_eq!(CompetitionLevel::from_name("medium"), CompetitionLevel::Medium);
        assert_eq!(CompetitionLevel::from_name("UNRECOGNIZED"), CompetitionLevel::Unknown);
    }

    #[test]
    fn test_display() {
        assert_eq!(CompetitionLevel::High.to_string(), "HIGH");
        assert_eq!(CompetitionLevel::Unspecified.to_string(), "UNSPECIFIED");
    }
}
