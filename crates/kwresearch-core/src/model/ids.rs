use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

fn digits_only(raw: &str, what: &str) -> Result<String> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '-').collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidData(format!(
            "{what} must be numeric (dashes allowed), got {raw:?}"
        )));
    }
    Ok(cleaned)
}

macro_rules! define_criterion_id {
    ($name:ident, $resource:literal, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: &str) -> Result<Self> {
                digits_only(raw, stringify!($name)).map(Self)
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The API resource name, e.g.
            #[doc = concat!("`", $resource, "/1000`.")]
            #[must_use]
            pub fn resource_name(&self) -> String {
                format!("{}/{}", $resource, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                Self::new(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_criterion_id!(
    LanguageId,
    "languageConstants",
    "Language criterion id (1000 is English)."
);
define_criterion_id!(
    LocationId,
    "geoTargetConstants",
    "Geo target criterion id (2840 is the United States)."
);

/// Ads account customer id, stored without dashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerId(String);

impl CustomerId {
    /// Accepts either `123-456-7890` or `1234567890`.
    pub fn new(raw: &str) -> Result<Self> {
        digits_only(raw, "customer id").map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CustomerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CustomerId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<CustomerId> for String {
    fn from(id: CustomerId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_id_strips_dashes() {
        let id = CustomerId::new("123-456-7890").unwrap();
        assert_eq!(id.as_str(), "1234567890");
        assert_eq!(id.to_string(), "1234567890");
    }

    #[test]
    fn test_customer_id_rejects_letters() {
        assert!(CustomerId::new("abc-123").is_err());
        assert!(CustomerId::new("").is_err());
        assert!(CustomerId::new("---").is_err());
    }

    #[test]
    fn test_language_resource_name() {
        let id = LanguageId::new("1000").unwrap();
        assert_eq!(id.resource_name(), "languageConstants/1000");
    }

    #[test]
    fn test_location_resource_name() {
        let id: LocationId = "2840".parse().unwrap();
        assert_eq!(id.resource_name(), "geoTargetConstants/2840");
    }

    #[test]
    fn test_id_deserializes_from_string() {
        let id: LanguageId = serde_json::from_str("\"1000\"").unwrap();
        assert_eq!(id.as_str(), "1000");
        assert!(serde_json::from_str::<LanguageId>("\"en\"").is_err());
    }
}
