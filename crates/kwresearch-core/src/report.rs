//! CSV results report.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::error::Result;
use crate::model::{LanguageId, LocationId, MetricsMap};

pub const HEADER: [&str; 6] = [
    "Keyword",
    "Monthly Search Volume",
    "Competition Level",
    "Competition Index",
    "Language ID",
    "Location ID",
];

/// Timestamped default report name, e.g. `keyword_results_20240131_235959.csv`.
pub fn default_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("keyword_results_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Writes a [`MetricsMap`] as CSV, tagging every row with the language and
/// location the metrics were requested for.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    language: LanguageId,
    location: LocationId,
}

impl ReportWriter {
    #[must_use]
    pub fn new(language: LanguageId, location: LocationId) -> Self {
        Self { language, location }
    }

    /// Write the report to `path`, replacing any existing file.
    pub fn write_file(&self, path: &Path, results: &MetricsMap) -> Result<PathBuf> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        self.write_to(file, results)?;
        log::info!("Wrote {} rows to {}", results.len(), path.display());
        Ok(path.to_path_buf())
    }

    pub fn write_to<W: Write>(&self, writer: W, results: &MetricsMap) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(HEADER)?;

        for metrics in results.values() {
            let searches = metrics.avg_monthly_searches.to_string();
            let index = metrics.competition_index.to_string();
            wtr.write_record([
                metrics.keyword.as_str(),
                searches.as_str(),
                metrics.competition.as_str(),
                index.as_str(),
                self.language.as_str(),
                self.location.as_str(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }
}
