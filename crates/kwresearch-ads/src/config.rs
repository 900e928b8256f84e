use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

use kwresearch_core::model::{CustomerId, LanguageId, LocationId};
use kwresearch_core::BatchSize;

use crate::client::DEFAULT_API_VERSION;
use crate::credentials::DEFAULT_CREDENTIALS_FILE;
use crate::pipeline::PipelineOptions;

/// Configuration for kwresearch.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (KWR_* prefix)
/// 3. Config file (~/.config/kwresearch/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the Google Ads credentials file.
    ///
    /// - ENV: KWR_CREDENTIALS_PATH
    /// - Default: google-ads.yaml
    pub credentials_path: PathBuf,

    /// Ads account to run keyword planning under (dashes allowed).
    ///
    /// - CLI: --customer-id 123-456-7890
    /// - ENV: KWR_CUSTOMER_ID
    pub customer_id: Option<String>,

    /// Language criterion id. Default: 1000 (English).
    pub language_id: String,

    /// Geo target criterion id. Default: 2840 (United States).
    pub location_id: String,

    /// Seed keyword file, one keyword per line. Default: domain.txt
    pub input_path: PathBuf,

    /// Directory for timestamped results files. Default: current directory.
    pub output_dir: PathBuf,

    /// Ledger of keywords from failed batches. Default: failed_keywords.txt
    pub failed_keywords_path: PathBuf,

    /// Log file written alongside stdout. Default: keyword_research.log
    pub log_path: PathBuf,

    /// Log level filter when RUST_LOG is unset. Default: info
    pub log_level: String,

    /// Seed keywords per request. Must be positive. Default: 20
    #[serde(deserialize_with = "number_or_string")]
    pub batch_size: usize,

    /// Minimum spacing between requests. Default: 1500
    #[serde(deserialize_with = "number_or_string")]
    pub min_request_interval_ms: u64,

    /// Extra pause after quota exhaustion. Default: 5
    #[serde(deserialize_with = "number_or_string")]
    pub rate_limit_cooldown_secs: u64,

    /// Page-size hint sent with each request. Default: 1
    #[serde(deserialize_with = "number_or_string")]
    pub page_size: u32,

    /// Google Ads API version path segment. Default: v22
    pub api_version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
            customer_id: None,
            language_id: "1000".to_string(),
            location_id: "2840".to_string(),
            input_path: PathBuf::from("domain.txt"),
            output_dir: PathBuf::from("."),
            failed_keywords_path: PathBuf::from(kwresearch_core::ledger::DEFAULT_LEDGER_FILE),
            log_path: PathBuf::from("keyword_research.log"),
            log_level: "info".to_string(),
            batch_size: BatchSize::DEFAULT,
            min_request_interval_ms: 1500,
            rate_limit_cooldown_secs: 5,
            page_size: 1,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(u64),
    Text(String),
}

/// Environment overrides arrive as strings (`KWR_BATCH_SIZE=10` becomes
/// `batch_size = "10"`), so integer keys accept either form.
fn number_or_string<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
    T::Error: Display,
{
    let value = match RawNumber::deserialize(deserializer)? {
        RawNumber::Number(n) => n,
        RawNumber::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| D::Error::custom(format!("expected a whole number, got {s:?}: {e}")))?,
    };
    T::try_from(value).map_err(D::Error::custom)
}

/// Keys accepted by `config get` / `config set`.
pub const KEYS: &[&str] = &[
    "credentials_path",
    "customer_id",
    "language_id",
    "location_id",
    "input_path",
    "output_dir",
    "failed_keywords_path",
    "log_path",
    "log_level",
    "batch_size",
    "min_request_interval_ms",
    "rate_limit_cooldown_secs",
    "page_size",
    "api_version",
];

/// Keys whose TOML values are integers rather than strings.
pub const INTEGER_KEYS: &[&str] = &[
    "batch_size",
    "min_request_interval_ms",
    "rate_limit_cooldown_secs",
    "page_size",
];

impl Config {
    /// Load configuration from `config_path` (if it exists) and environment
    /// variables with the KWR_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("kwr");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;
        Ok(config)
    }

    /// Render a single key's effective value, or `None` for unknown keys.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "credentials_path" => self.credentials_path.display().to_string(),
            "customer_id" => self
                .customer_id
                .clone()
                .unwrap_or_else(|| "<not set>".to_string()),
            "language_id" => self.language_id.clone(),
            "location_id" => self.location_id.clone(),
            "input_path" => self.input_path.display().to_string(),
            "output_dir" => self.output_dir.display().to_string(),
            "failed_keywords_path" => self.failed_keywords_path.display().to_string(),
            "log_path" => self.log_path.display().to_string(),
            "log_level" => self.log_level.clone(),
            "batch_size" => self.batch_size.to_string(),
            "min_request_interval_ms" => self.min_request_interval_ms.to_string(),
            "rate_limit_cooldown_secs" => self.rate_limit_cooldown_secs.to_string(),
            "page_size" => self.page_size.to_string(),
            "api_version" => self.api_version.clone(),
            _ => return None,
        };
        Some(value)
    }

    pub fn customer_id(&self) -> Result<CustomerId> {
        let raw = self.customer_id.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "No customer id configured. Pass --customer-id, set KWR_CUSTOMER_ID, \
                 or run 'kwresearch config set customer_id <id>'"
            )
        })?;
        CustomerId::new(raw).context("Invalid customer_id")
    }

    pub fn language(&self) -> Result<LanguageId> {
        LanguageId::new(&self.language_id).context("Invalid language_id")
    }

    pub fn location(&self) -> Result<LocationId> {
        LocationId::new(&self.location_id).context("Invalid location_id")
    }

    pub fn batch_size(&self) -> Result<BatchSize> {
        BatchSize::new(self.batch_size).context("Invalid batch_size")
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    /// Check that the value stored under `key` is usable.
    pub fn validate_key(&self, key: &str) -> Result<()> {
        match key {
            "customer_id" => self.customer_id().map(drop),
            "language_id" => self.language().map(drop),
            "location_id" => self.location().map(drop),
            "batch_size" => self.batch_size().map(drop),
            _ => Ok(()),
        }
    }

    /// Validated pipeline options.
    pub fn pipeline_options(&self) -> Result<PipelineOptions> {
        Ok(PipelineOptions::new(self.customer_id()?)
            .with_batch_size(self.batch_size()?)
            .with_page_size(self.page_size)
            .with_rate_limit_cooldown(self.rate_limit_cooldown()))
    }
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/kwresearch/config.toml
/// - macOS: ~/Library/Application Support/kwresearch/config.toml
/// - Windows: %APPDATA%\kwresearch\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kwresearch")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# kwresearch Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (KWR_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Google Ads account to run keyword planning under.
# Dashes are optional: "123-456-7890" and "1234567890" are equivalent.
#
# Can also be set via:
# - CLI: kwresearch run --customer-id 123-456-7890
# - Environment: KWR_CUSTOMER_ID=1234567890
customer_id = "your-customer-id-here"

# Credentials file in the google-ads.yaml format used by the official
# client libraries (developer_token, client_id, client_secret,
# refresh_token, optional login_customer_id).
# Run 'kwresearch auth --client-secret client_secret.json' to mint a
# refresh token.
credentials_path = "google-ads.yaml"

# Targeting: 1000 = English, 2840 = United States.
language_id = "1000"
location_id = "2840"

# Files
input_path = "domain.txt"
output_dir = "."
failed_keywords_path = "failed_keywords.txt"
log_path = "keyword_research.log"
log_level = "info"

# Request pacing. The keyword planner enforces a per-second quota; keep
# requests sequential and spaced.
batch_size = 20
min_request_interval_ms = 1500
rate_limit_cooldown_secs = 5
page_size = 1

# Google Ads API version. Google retires each version roughly a year after
# release; when requests start failing with 404/UNIMPLEMENTED, bump this to
# a supported version (https://developers.google.com/google-ads/api/docs/sunset-dates).
api_version = "v22"
"#
}

/// Create the config file at `config_path` if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file(config_path: &Path) -> Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.credentials_path, PathBuf::from("google-ads.yaml"));
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.min_request_interval(), Duration::from_millis(1500));
        assert_eq!(config.rate_limit_cooldown(), Duration::from_secs(5));
        assert!(config.customer_id.is_none());
    }

    #[test]
    fn test_config_load_without_file() {
        let dir = TempDir::new().unwrap();
        let result = Config::load_from(&dir.path().join("missing.toml"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_example_config_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        assert!(ensure_config_file(&path).unwrap());
        assert!(!ensure_config_file(&path).unwrap());

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.language_id, "1000");
        assert_eq!(config.batch_size, 20);
    }

    #[test]
    fn test_customer_id_required() {
        let config = Config::default();
        assert!(config.customer_id().is_err());
        assert!(config.pipeline_options().is_err());

        let config = Config {
            customer_id: Some("123-456-7890".to_string()),
            ..Config::default()
        };
        assert_eq!(config.customer_id().unwrap().as_str(), "1234567890");
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = Config {
            batch_size: 0,
            customer_id: Some("1234567890".to_string()),
            ..Config::default()
        };
        assert!(config.batch_size().is_err());
        assert!(config.pipeline_options().is_err());
    }

    #[test]
    fn test_integer_keys_accept_strings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "batch_size = \"10\"\nmin_request_interval_ms = \" 2000 \"\npage_size = 5\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.min_request_interval(), Duration::from_millis(2000));
        assert_eq!(config.page_size, 5);
    }

    #[test]
    fn test_integer_keys_reject_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "page_size = \"ten\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        std::fs::write(&path, "page_size = -1\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        std::fs::write(&path, "page_size = 99999999999\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_env_integer_override() {
        // No other test in this module reads this key.
        std::env::set_var("KWR_RATE_LIMIT_COOLDOWN_SECS", "9");
        let dir = TempDir::new().unwrap();
        let result = Config::load_from(&dir.path().join("missing.toml"));
        std::env::remove_var("KWR_RATE_LIMIT_COOLDOWN_SECS");

        let config = result.unwrap();
        assert_eq!(config.rate_limit_cooldown(), Duration::from_secs(9));
    }

    #[test]
    fn test_validate_key() {
        let config = Config {
            customer_id: Some("not-a-number".to_string()),
            batch_size: 0,
            ..Config::default()
        };
        assert!(config.validate_key("customer_id").is_err());
        assert!(config.validate_key("batch_size").is_err());
        assert!(config.validate_key("language_id").is_ok());
        assert!(config.validate_key("log_path").is_ok());
    }

    #[test]
    fn test_get_known_and_unknown_keys() {
        let config = Config::default();
        for key in KEYS {
            assert!(config.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(config.get("customer_id").as_deref(), Some("<not set>"));
        assert!(config.get("nope").is_none());
    }
}
