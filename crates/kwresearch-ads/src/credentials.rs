//! Google Ads API credentials (`google-ads.yaml`).

use std::fmt;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use kwresearch_core::model::CustomerId;

use crate::error::{AdsError, AdsResult};

pub const DEFAULT_CREDENTIALS_FILE: &str = "google-ads.yaml";

/// Everything needed to authenticate against the API.
///
/// Read from the same YAML file the official client libraries use; keys
/// this tool doesn't need (`use_proto_plus`, ...) are ignored.
#[derive(Clone, Deserialize)]
pub struct AdsCredentials {
    pub developer_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,

    /// Manager account to act through, when the target customer is a
    /// client account.
    #[serde(default, deserialize_with = "optional_customer_id")]
    pub login_customer_id: Option<CustomerId>,
}

impl AdsCredentials {
    /// Load credentials from a YAML file.
    ///
    /// A missing file, unreadable file, or a file lacking any required key
    /// is a [`AdsError::Credentials`] error.
    pub fn from_file(path: &Path) -> AdsResult<Self> {
        if !path.exists() {
            return Err(AdsError::Credentials {
                path: path.to_path_buf(),
                message: "file not found".to_string(),
            });
        }

        let contents = std::fs::read_to_string(path).map_err(|e| AdsError::Credentials {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_yaml(&contents).map_err(|message| AdsError::Credentials {
            path: path.to_path_buf(),
            message,
        })
    }

    fn from_yaml(contents: &str) -> Result<Self, String> {
        let credentials: Self = serde_yaml::from_str(contents).map_err(|e| e.to_string())?;
        for (key, value) in [
            ("developer_token", &credentials.developer_token),
            ("client_id", &credentials.client_id),
            ("client_secret", &credentials.client_secret),
            ("refresh_token", &credentials.refresh_token),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{key} is empty"));
            }
        }
        Ok(credentials)
    }
}

impl fmt::Debug for AdsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdsCredentials")
            .field("developer_token", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("login_customer_id", &self.login_customer_id)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

/// YAML writers often leave customer ids unquoted, so accept numbers too.
fn optional_customer_id<'de, D>(deserializer: D) -> Result<Option<CustomerId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawId>::deserialize(deserializer)?;
    raw.map(|raw| {
        let text = match raw {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        };
        CustomerId::new(&text).map_err(D::Error::custom)
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const YAML: &str = r#"
developer_token: "dev-token"
client_id: "client.apps.googleusercontent.com"
client_secret: "shh"
refresh_token: "1//refresh"
login_customer_id: 123-456-7890
use_proto_plus: True
"#;

    #[test]
    fn test_from_yaml() {
        let creds = AdsCredentials::from_yaml(YAML).unwrap();
        assert_eq!(creds.developer_token, "dev-token");
        assert_eq!(creds.refresh_token, "1//refresh");
        assert_eq!(
            creds.login_customer_id.as_ref().map(CustomerId::as_str),
            Some("1234567890")
        );
    }

    #[test]
    fn test_numeric_login_customer_id() {
        let yaml = YAML.replace("123-456-7890", "9876543210");
        let creds = AdsCredentials::from_yaml(&yaml).unwrap();
        assert_eq!(
            creds.login_customer_id.as_ref().map(CustomerId::as_str),
            Some("9876543210")
        );
    }

    #[test]
    fn test_login_customer_id_optional() {
        let yaml: String = YAML
            .lines()
            .filter(|l| !l.starts_with("login_customer_id"))
            .collect::<Vec<_>>()
            .join("\n");
        let creds = AdsCredentials::from_yaml(&yaml).unwrap();
        assert!(creds.login_customer_id.is_none());
    }

    #[test]
    fn test_missing_key_is_error() {
        let yaml = "developer_token: x\nclient_id: y\nclient_secret: z\n";
        assert!(AdsCredentials::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_empty_value_is_error() {
        let yaml = YAML.replace("\"shh\"", "\"\"");
        let err = AdsCredentials::from_yaml(&yaml).unwrap_err();
        assert!(err.contains("client_secret"));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = AdsCredentials::from_file(&dir.path().join("google-ads.yaml")).unwrap_err();
        assert!(matches!(err, AdsError::Credentials { .. }));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("google-ads.yaml");
        std::fs::write(&path, YAML).unwrap();
        assert!(AdsCredentials::from_file(&path).is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = AdsCredentials::from_yaml(YAML).unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("shh"));
        assert!(!debug.contains("1//refresh"));
        assert!(debug.contains("<redacted>"));
    }
}
