use anyhow::{Context, Result};
use chrono::Local;
use std::path::PathBuf;

use kwresearch_ads::{AdsCredentials, BatchPipeline, Config, GoogleAdsClient, Throttle};
use kwresearch_core::{read_keywords, report, FailureLedger, ReportWriter};

/// Per-run overrides. Anything left unset falls back to the config file,
/// then KWR_* environment variables, then built-in defaults.
#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// Seed keyword file, one keyword per line
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Directory to write the results CSV into
    #[arg(long, short)]
    output_dir: Option<PathBuf>,

    /// Language criterion id (1000 = English)
    #[arg(long)]
    language: Option<String>,

    /// Geo target criterion id (2840 = United States)
    #[arg(long)]
    location: Option<String>,

    /// Google Ads customer id, with or without dashes
    #[arg(long)]
    customer_id: Option<String>,

    /// Seed keywords per request
    #[arg(long)]
    batch_size: Option<usize>,

    /// Credentials file (google-ads.yaml)
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// File to append keywords from failed batches to
    #[arg(long)]
    failed_keywords: Option<PathBuf>,
}

impl RunArgs {
    /// Overlay the command-line values onto `config`.
    pub fn apply(self, config: &mut Config) {
        if let Some(input) = self.input {
            config.input_path = input;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(language) = self.language {
            config.language_id = language;
        }
        if let Some(location) = self.location {
            config.location_id = location;
        }
        if let Some(customer_id) = self.customer_id {
            config.customer_id = Some(customer_id);
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(credentials) = self.credentials {
            config.credentials_path = credentials;
        }
        if let Some(failed_keywords) = self.failed_keywords {
            config.failed_keywords_path = failed_keywords;
        }
    }
}

pub async fn run(config: Config) -> Result<()> {
    log::info!("Starting keyword research");

    // Everything up to the first request is fatal; after that, failures
    // are handled per batch.
    let options = config.pipeline_options()?;
    let language = config.language()?;
    let location = config.location()?;

    let credentials = AdsCredentials::from_file(&config.credentials_path)
        .context("Failed to load Google Ads credentials")?;

    let keywords = read_keywords(&config.input_path).context("Failed to read keywords")?;
    log::info!(
        "Loaded {} keywords from {}",
        keywords.len(),
        config.input_path.display()
    );

    let client = GoogleAdsClient::builder(credentials)
        .api_version(config.api_version.as_str())
        .connect()
        .await
        .context("Failed to initialise Google Ads client")?;

    let mut pipeline = BatchPipeline::new(
        client,
        Throttle::new(config.min_request_interval()),
        FailureLedger::new(&config.failed_keywords_path),
        options,
    );

    let results = pipeline.fetch_metrics(&keywords, &language, &location).await;

    let output = config
        .output_dir
        .join(report::default_file_name(&Local::now()));
    let written = ReportWriter::new(language, location)
        .write_file(&output, &results)
        .context("Failed to write results")?;

    let stats = pipeline.stats();
    println!("\n✓ Keyword research complete");
    println!("  Keywords submitted: {}", keywords.len());
    println!("  Keywords with metrics: {}", results.len());
    println!(
        "  Batches: {} succeeded, {} failed ({} rate limited)",
        stats.succeeded, stats.failed, stats.rate_limited
    );
    println!("  Results: {}", written.display());

    if stats.keywords_ledgered > 0 {
        println!(
            "  {} keywords from failed batches appended to {}",
            stats.keywords_ledgered,
            pipeline.ledger().path().display()
        );
    }

    Ok(())
}
