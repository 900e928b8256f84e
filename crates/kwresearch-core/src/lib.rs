//! Core domain model for kwresearch.
//!
//! This crate defines the keyword metrics model (competition levels,
//! per-keyword metrics, target identifiers), batch partitioning, and the
//! files a run reads and writes: the keyword input list, the failure
//! ledger, and the CSV results report.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod batch;
pub mod error;
pub mod input;
pub mod ledger;
pub mod model;
pub mod report;

pub use batch::{partition, BatchSize};
pub use error::{Error, Result};
pub use input::read_keywords;
pub use ledger::FailureLedger;
pub use model::{CompetitionLevel, CustomerId, KeywordMetrics, LanguageId, LocationId, MetricsMap};
pub use report::ReportWriter;
