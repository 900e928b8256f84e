use anyhow::{Context, Result};
use std::path::Path;
use toml_edit::{value, DocumentMut};

use kwresearch_ads::config::{self, Config, INTEGER_KEYS, KEYS};

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow::anyhow!("Unknown config key: {}\n\nValid keys: {}", key, KEYS.join(", "))
}

/// Show the current effective configuration.
pub fn show_config(config_path: &Path) -> Result<()> {
    let config = Config::load_from(config_path)?;

    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config_path.display());
    let exists = config_path.exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    for key in KEYS {
        if let Some(value) = config.get(key) {
            println!("  {key}: {value}");
        }
    }

    println!("\nPriority: CLI args > ENV vars (KWR_*) > Config file > Defaults");

    Ok(())
}

/// Get a specific config value, or print the whole file.
pub fn get_config(config_path: &Path, key: Option<String>) -> Result<()> {
    if let Some(key) = key {
        let config = Config::load_from(config_path)?;
        let value = config.get(&key).ok_or_else(|| unknown_key(&key))?;
        println!("{value}");
    } else if config_path.exists() {
        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;
        print!("{contents}");
    } else {
        println!("Config file does not exist: {}", config_path.display());
        println!("\nRun 'kwresearch config init' to create it.");
    }

    Ok(())
}

/// Set `key` in the document, keeping comments and layout intact.
///
/// The edited document must still load as a [`Config`] and the new value
/// must pass validation, otherwise nothing is returned for writing.
fn set_in_document(contents: &str, key: &str, raw: &str) -> Result<String> {
    if !KEYS.contains(&key) {
        return Err(unknown_key(key));
    }

    let mut doc: DocumentMut = contents.parse().context("Failed to parse config file")?;
    if INTEGER_KEYS.contains(&key) {
        let number: i64 = raw
            .parse()
            .with_context(|| format!("{key} must be a whole number, got {raw:?}"))?;
        doc[key] = value(number);
    } else {
        doc[key] = value(raw);
    }

    let updated = doc.to_string();
    let config: Config = toml_edit::de::from_str(&updated)
        .with_context(|| format!("Invalid value for {key}: {raw:?}"))?;
    config
        .validate_key(key)
        .with_context(|| format!("Invalid value for {key}: {raw:?}"))?;
    Ok(updated)
}

/// Set a config value.
pub fn set_config(config_path: &Path, key: &str, raw: &str) -> Result<()> {
    config::ensure_config_file(config_path)?;

    let contents = std::fs::read_to_string(config_path).context("Failed to read config file")?;
    let updated = set_in_document(&contents, key, raw)?;

    std::fs::write(config_path, updated).context("Failed to write config file")?;

    println!("✓ Updated {key} = {raw}");
    println!("  in {}", config_path.display());

    Ok(())
}

/// Show the config file path.
pub fn show_path(config_path: &Path) {
    println!("{}", config_path.display());
}

/// Show example configuration.
pub fn show_example() {
    print!("{}", config::example_config());
}

/// Initialize config file with defaults.
pub fn init_config(config_path: &Path) -> Result<()> {
    let created = config::ensure_config_file(config_path)?;

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to set your customer_id and credentials path.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
