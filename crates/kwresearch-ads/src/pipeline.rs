//! Rate-limited batch pipeline.
//!
//! Splits the seed keywords into batches, sends each batch through the
//! [`KeywordIdeaService`] behind a [`Throttle`], and folds the returned
//! ideas into a [`MetricsMap`]. A failing batch never aborts the run: its
//! keywords go to the [`FailureLedger`] and the next batch proceeds.

use std::time::Duration;

use tokio::time::sleep;

use kwresearch_core::model::{
    CompetitionLevel, CustomerId, KeywordMetrics, LanguageId, LocationId, MetricsMap,
};
use kwresearch_core::{partition, BatchSize, FailureLedger};

use crate::error::AdsError;
use crate::resilience::{Throttle, DEFAULT_RATE_LIMIT_COOLDOWN};
use crate::service::{KeywordIdea, KeywordIdeaService, KeywordIdeasRequest, DEFAULT_PAGE_SIZE};

/// Tunables for a [`BatchPipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub customer_id: CustomerId,
    pub batch_size: BatchSize,
    pub page_size: u32,
    /// Extra pause after a quota-exhaustion error.
    pub rate_limit_cooldown: Duration,
}

impl PipelineOptions {
    #[must_use]
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            batch_size: BatchSize::default(),
            page_size: DEFAULT_PAGE_SIZE,
            rate_limit_cooldown: DEFAULT_RATE_LIMIT_COOLDOWN,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: BatchSize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_rate_limit_cooldown(mut self, cooldown: Duration) -> Self {
        self.rate_limit_cooldown = cooldown;
        self
    }
}

/// Counters for the most recent [`BatchPipeline::fetch_metrics`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub batches: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rate_limited: usize,
    pub ideas_received: usize,
    pub keywords_ledgered: usize,
}

/// What happened to one batch.
#[derive(Debug)]
pub enum BatchOutcome {
    Succeeded { ideas: usize },
    Failed(AdsError),
}

/// Translate an idea record into metrics, mapping the competition code
/// through the fixed table.
#[must_use]
pub fn to_metrics(idea: KeywordIdea) -> KeywordMetrics {
    KeywordMetrics::new(
        idea.text,
        idea.metrics.avg_monthly_searches,
        CompetitionLevel::from_code(idea.metrics.competition),
        idea.metrics.competition_index,
    )
}

/// Sequential, throttled keyword metrics fetcher.
#[derive(Debug)]
pub struct BatchPipeline<S> {
    service: S,
    throttle: Throttle,
    ledger: FailureLedger,
    options: PipelineOptions,
    stats: RunStats,
}

impl<S: KeywordIdeaService> BatchPipeline<S> {
    #[must_use]
    pub fn new(service: S, throttle: Throttle, ledger: FailureLedger, options: PipelineOptions) -> Self {
        Self {
            service,
            throttle,
            ledger,
            options,
            stats: RunStats::default(),
        }
    }

    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    #[must_use]
    pub fn ledger(&self) -> &FailureLedger {
        &self.ledger
    }

    #[must_use]
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Fetch metrics for every keyword, batch by batch.
    ///
    /// Never fails: per-batch errors are logged and ledgered. Keywords the
    /// service returns no idea for are simply absent from the result, and
    /// ideas the service adds beyond the seeds are kept.
    pub async fn fetch_metrics(
        &mut self,
        keywords: &[String],
        language: &LanguageId,
        location: &LocationId,
    ) -> MetricsMap {
        let mut results = MetricsMap::new();
        self.stats = RunStats::default();

        if keywords.is_empty() {
            log::warn!("No keywords provided to process");
            return results;
        }

        let batch_size = self.options.batch_size;
        let total = batch_size.batch_count(keywords.len());
        log::info!(
            "Fetching metrics for {} keywords in {} batches of up to {}",
            keywords.len(),
            total,
            batch_size
        );

        for (index, batch) in partition(keywords, batch_size).enumerate() {
            log::info!("Processing batch {} of {}", index + 1, total);
            self.stats.batches += 1;

            let outcome = self.run_batch(batch, language, location, &mut results).await;
            self.settle(batch, outcome).await;
        }

        log::info!(
            "Finished: {} of {} batches succeeded, {} keywords with metrics",
            self.stats.succeeded,
            self.stats.batches,
            results.len()
        );
        results
    }

    async fn run_batch(
        &mut self,
        batch: &[String],
        language: &LanguageId,
        location: &LocationId,
        results: &mut MetricsMap,
    ) -> BatchOutcome {
        self.throttle.wait_if_needed().await;

        let request = KeywordIdeasRequest::new(
            self.options.customer_id.clone(),
            batch,
            language.clone(),
            location.clone(),
        )
        .with_page_size(self.options.page_size);

        match self.service.generate_keyword_ideas(&request).await {
            Ok(ideas) => {
                let count = ideas.len();
                for idea in ideas {
                    if idea.text.is_empty() {
                        log::debug!("Skipping idea with empty keyword text");
                        continue;
                    }
                    let metrics = to_metrics(idea);
                    results.insert(metrics.keyword.clone(), metrics);
                }
                BatchOutcome::Succeeded { ideas: count }
            }
            Err(e) => BatchOutcome::Failed(e),
        }
    }

    async fn settle(&mut self, batch: &[String], outcome: BatchOutcome) {
        match outcome {
            BatchOutcome::Succeeded { ideas } => {
                log::debug!("Batch returned {} ideas", ideas);
                self.stats.succeeded += 1;
                self.stats.ideas_received += ideas;
            }
            BatchOutcome::Failed(err) => {
                self.stats.failed += 1;
                log_failure(&err);
                self.record_failure(batch);

                if err.is_rate_limited() {
                    self.stats.rate_limited += 1;
                    log::info!(
                        "Rate limit hit, waiting {} seconds before next request",
                        self.options.rate_limit_cooldown.as_secs_f64()
                    );
                    sleep(self.options.rate_limit_cooldown).await;
                }
            }
        }
    }

    fn record_failure(&mut self, batch: &[String]) {
        match self.ledger.record(batch) {
            Ok(()) => self.stats.keywords_ledgered += batch.len(),
            Err(e) => log::error!(
                "Could not record {} failed keywords to {}: {}",
                batch.len(),
                self.ledger.path().display(),
                e
            ),
        }
    }
}

fn log_failure(err: &AdsError) {
    if let AdsError::Service(failure) = err {
        log::error!("Request failed with status {}", failure.status);
        if !failure.message.is_empty() {
            log::error!("\t{}", failure.message);
        }
        for error in &failure.errors {
            log::error!("\tError with message \"{}\".", error.message);
            for field in &error.field_path {
                log::error!("\t\tOn field: {}", field);
            }
        }
        if let Some(request_id) = &failure.request_id {
            log::debug!("\tRequest id: {}", request_id);
        }
    } else {
        log::error!("Unexpected error processing batch: {}", err);
    }
}
