use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kwresearch_ads::{config, Config};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "kwresearch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: ~/.config/kwresearch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Fetch search volume and competition for a list of keywords
    ///
    /// Reads seed keywords from the input file (one per line, blank lines
    /// ignored), sends them to the Google Ads keyword planner in batches,
    /// and writes the results to a timestamped CSV file:
    ///
    ///   keyword_results_YYYYMMDD_HHMMSS.csv
    ///
    /// Requests are sent one at a time, spaced by min_request_interval_ms.
    /// A failed batch never stops the run: its keywords are appended to the
    /// failed keywords file so they can be retried later with
    /// 'kwresearch run --input failed_keywords.txt'. Quota errors add an
    /// extra cooldown before the next batch.
    ///
    /// Progress is logged to stdout and appended to the log file.
    Run(commands::run::RunArgs),

    /// Mint a refresh token through the browser consent flow
    ///
    /// Opens a one-shot listener on 127.0.0.1, prints the Google consent URL,
    /// and waits for the redirect. The refresh token it prints goes into
    /// google-ads.yaml.
    Auth {
        /// OAuth client secret JSON downloaded from Google Cloud
        #[arg(long)]
        client_secret: PathBuf,

        /// Loopback port to listen on (default: any free port)
        #[arg(long, default_value_t = 0)]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the current effective configuration
    Show,
    /// Get a config value, or print the config file if no key is given
    Get {
        /// Config key (e.g. customer_id, batch_size)
        key: Option<String>,
    },
    /// Set a config value in the config file
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Show the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults if it does not exist
    Init,
}

/// Route log records to stdout and, when `log_file` is given, append them to
/// that file as well.
fn init_logging(level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .context("Failed to initialise logging")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(config::config_file_path);

    match cli.command {
        Commands::Run(args) => {
            let mut config = Config::load_from(&config_path)?;
            args.apply(&mut config);
            init_logging(&config.log_level, Some(&config.log_path))?;
            commands::run::run(config).await?;
        }
        Commands::Auth {
            client_secret,
            port,
        } => {
            let config = Config::load_from(&config_path)?;
            init_logging(&config.log_level, None)?;
            commands::auth::run_auth(&client_secret, port).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config_path)?,
            ConfigAction::Get { key } => commands::config::get_config(&config_path, key)?,
            ConfigAction::Set { key, value } => {
                commands::config::set_config(&config_path, &key, &value)?;
            }
            ConfigAction::Path => commands::config::show_path(&config_path),
            ConfigAction::Example => commands::config::show_example(),
            ConfigAction::Init => commands::config::init_config(&config_path)?,
        },
    }

    Ok(())
}
