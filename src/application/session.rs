//! Scrape session runner
//!
//! Processes the target list one detail page at a time: fetch, extract,
//! classify, retry. The unit of retry is the whole attempt - a page whose
//! extraction comes back incomplete is refetched, never re-extracted from
//! the stale document. Only the terminal attempt's failures reach the
//! errors dataset.

use scraper::Html;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::domain::detail::{AppDetail, DetailExtraction};
use crate::domain::run::{ErrorEntry, RunOutput, TargetReport};
use crate::infrastructure::config::ScrapingConfig;
use crate::infrastructure::http_client::{FetchError, HttpClient};
use crate::infrastructure::parsing::{AppDetailParser, ParsedPage};

/// One attempt at a target, fetch through classification.
enum AttemptOutcome {
    /// The target produced a record: either fully extracted or marked
    /// incomplete by the listing banner.
    Success(AppDetail),
    /// The fetch itself failed.
    FetchFailed(FetchError),
    /// The page was fetched but required fields stayed unresolved.
    Incomplete(DetailExtraction),
}

/// Runs one harvesting session over a target list.
#[derive(Clone)]
pub struct ScrapeSession {
    http: HttpClient,
    parser: Arc<AppDetailParser>,
    config: ScrapingConfig,
}

impl ScrapeSession {
    pub fn new(http: HttpClient, parser: Arc<AppDetailParser>, config: ScrapingConfig) -> Self {
        Self {
            http,
            parser,
            config,
        }
    }

    /// Process every target and return the accumulated run output.
    ///
    /// `timestamp` is the run start time stamped into every record. With
    /// `max_concurrent` at 1 targets run strictly in input order; a larger
    /// pool keeps the per-origin politeness delay through the shared gate
    /// and imposes no ordering on output rows.
    pub async fn run(&self, targets: &[String], timestamp: &str) -> RunOutput {
        let targets: Vec<String> = match self.config.batch_size {
            Some(limit) if targets.len() > limit => {
                info!("batch limit reached ({})", limit);
                targets[..limit].to_vec()
            }
            _ => targets.to_vec(),
        };
        let total = targets.len();

        if self.config.max_concurrent <= 1 {
            let mut output = RunOutput::default();
            for (index, url) in targets.iter().enumerate() {
                info!("processing {}/{} - {}", index + 1, total, url);
                output.absorb(self.process_target(url, timestamp).await);
            }
            return output;
        }

        self.run_concurrent(targets, timestamp).await
    }

    /// Bounded worker pool feeding a single aggregating loop over a channel.
    async fn run_concurrent(&self, targets: Vec<String>, timestamp: &str) -> RunOutput {
        let total = targets.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let (tx, mut rx) = mpsc::unbounded_channel();

        for (index, url) in targets.into_iter().enumerate() {
            let session = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            let timestamp = timestamp.to_string();
            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                info!("processing {}/{} - {}", index + 1, total, url);
                let report = session.process_target(&url, &timestamp).await;
                let _ = tx.send(report);
            });
        }
        drop(tx);

        let mut output = RunOutput::default();
        while let Some(report) = rx.recv().await {
            output.absorb(report);
        }
        output
    }

    /// Attempt loop for one target. Failures never escape: the worst case
    /// is a report carrying only error entries.
    async fn process_target(&self, url: &str, timestamp: &str) -> TargetReport {
        let max_attempts = self.config.effective_retries();
        let mut attempt = 1u32;

        loop {
            match self.attempt(url, timestamp).await {
                AttemptOutcome::Success(record) => {
                    debug!("recorded {} (complete: {})", url, record.complete_information);
                    return TargetReport::success(record);
                }
                AttemptOutcome::FetchFailed(error) if attempt >= max_attempts => {
                    warn!("giving up on {} after {} attempts: {}", url, attempt, error);
                    return TargetReport::failures(vec![ErrorEntry::request_failure(
                        url,
                        error.field_label(),
                        error.to_string(),
                    )]);
                }
                AttemptOutcome::Incomplete(extraction) if attempt >= max_attempts => {
                    let errors = ErrorEntry::field_failures(url, &extraction);
                    warn!(
                        "{} unresolved fields for {} after {} attempts",
                        errors.len(),
                        url,
                        attempt
                    );
                    return TargetReport::failures(errors);
                }
                AttemptOutcome::FetchFailed(error) => {
                    debug!("attempt {}/{} failed for {}: {}", attempt, max_attempts, url, error);
                }
                AttemptOutcome::Incomplete(_) => {
                    debug!(
                        "attempt {}/{} incomplete for {}, refetching",
                        attempt, max_attempts, url
                    );
                }
            }

            attempt += 1;
            // backoff scoped to this target; the politeness gate spaces the refetch
            sleep(self.config.request_delay() * 2).await;
        }
    }

    async fn attempt(&self, url: &str, timestamp: &str) -> AttemptOutcome {
        let body = match self.http.fetch_body(url).await {
            Ok(body) => body,
            Err(error) => return AttemptOutcome::FetchFailed(error),
        };

        match self.parser.parse(&Html::parse_document(&body)) {
            ParsedPage::IncompleteListing => {
                AttemptOutcome::Success(AppDetail::incomplete_listing(url, timestamp))
            }
            ParsedPage::Evaluated(extraction) => {
                if extraction.is_success() {
                    AttemptOutcome::Success(AppDetail::from_extraction(url, extraction, timestamp))
                } else {
                    AttemptOutcome::Incomplete(extraction)
                }
            }
        }
    }
}
