//! Sequential page collection for one source.
//!
//! Pages are requested strictly in order. Collection ends when the declared
//! page count is reached, when a page carries no listing fragments, when the
//! `max_pages` cap is hit, or when too many pages in a row fail to fetch.

use crate::config::{AppConfig, SourceConfig};
use crate::model::{FetchError, RawPayload, ScrapeError, ScrapeOutcome, SourceBatch, Vacancy};
use crate::parser::SourceParser;
use crate::scraper::traits::Fetcher;

use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Retry and stop policy, owned by the orchestrator and handed to every source.
#[derive(Debug, Clone)]
pub struct PaginationPolicy {
    pub consecutive_failure_threshold: u32,
    pub fetch_retries: u32,
    pub retry_delay: Duration,
}

impl From<&AppConfig> for PaginationPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            consecutive_failure_threshold: config.consecutive_failure_threshold.max(1),
            fetch_retries: config.fetch_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

enum PageError {
    Fetch(FetchError),
    Cancelled,
}

pub struct PageCollector<'a> {
    fetcher: &'a dyn Fetcher,
    parser: &'a dyn SourceParser,
    source: &'a SourceConfig,
    policy: &'a PaginationPolicy,
    cancel: &'a CancellationToken,
}

impl<'a> PageCollector<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        parser: &'a dyn SourceParser,
        source: &'a SourceConfig,
        policy: &'a PaginationPolicy,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            parser,
            source,
            policy,
            cancel,
        }
    }

    /// Walks the source's pages and returns whatever was gathered, with a
    /// failure marker when collection ended abnormally.
    pub async fn collect(&self) -> ScrapeOutcome {
        let id = self.source.id.as_str();
        let url = self.source.start_url();
        let mut batch = SourceBatch::new(id);

        let (first_page, max_pages) = match &self.source.pagination {
            Some(p) => (p.first_page, p.max_pages.max(1)),
            None => (0, 1),
        };

        let mut declared_total: Option<u32> = None;
        let mut consecutive_failures = 0u32;
        let mut last_fetch_error: Option<FetchError> = None;

        for offset in 0..max_pages {
            if declared_total.is_some_and(|total| offset >= total) {
                debug!("[{}] reached declared page count {}", id, offset);
                break;
            }
            if self.cancel.is_cancelled() {
                return self.cancelled(batch);
            }

            let params = self.page_params(first_page + offset);
            let payload = match self.fetch_with_retry(url, &params).await {
                Ok(payload) => payload,
                Err(PageError::Cancelled) => return self.cancelled(batch),
                Err(PageError::Fetch(e)) => {
                    batch.failed_pages += 1;
                    consecutive_failures += 1;
                    warn!(
                        "[{}] page {} failed ({}/{} in a row): {}",
                        id,
                        first_page + offset,
                        consecutive_failures,
                        self.policy.consecutive_failure_threshold,
                        e
                    );
                    if consecutive_failures >= self.policy.consecutive_failure_threshold {
                        return ScrapeOutcome::Failed {
                            error: ScrapeError::Fetch(e),
                            partial: batch,
                        };
                    }
                    last_fetch_error = Some(e);
                    continue;
                }
            };
            consecutive_failures = 0;

            let page = match self.parser.parse(&payload) {
                Ok(page) => page,
                Err(e) => {
                    error!("[{}] {}", id, e);
                    return ScrapeOutcome::Failed {
                        error: ScrapeError::Structure(e),
                        partial: batch,
                    };
                }
            };

            batch.pages_fetched += 1;
            batch.skipped += page.skipped;
            if declared_total.is_none() {
                declared_total = page.total_pages;
            }
            debug!(
                "[{}] page {}: {} vacancies, {} skipped",
                id,
                first_page + offset,
                page.vacancies.len(),
                page.skipped
            );

            let (vacancies, interrupted) = self.fill_descriptions(page.vacancies).await;
            batch.vacancies.extend(vacancies);
            if interrupted {
                return self.cancelled(batch);
            }

            if page.fragments == 0 {
                debug!("[{}] page {} is empty, stopping", id, first_page + offset);
                break;
            }
        }

        match last_fetch_error {
            Some(e) if batch.pages_fetched == 0 => ScrapeOutcome::Failed {
                error: ScrapeError::Fetch(e),
                partial: batch,
            },
            _ => {
                info!(
                    "[{}] collected {} vacancies from {} page(s)",
                    id,
                    batch.vacancies.len(),
                    batch.pages_fetched
                );
                ScrapeOutcome::Collected(batch)
            }
        }
    }

    fn page_params(&self, page: u32) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .source
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(pagination) = &self.source.pagination {
            params.push((pagination.page_param.clone(), page.to_string()));
        }
        params
    }

    async fn fetch_once(&self, url: &str, params: &[(String, String)]) -> Result<RawPayload, PageError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PageError::Cancelled),
            result = self.fetcher.fetch(url, params) => result.map_err(PageError::Fetch),
        }
    }

    async fn fetch_with_retry(&self, url: &str, params: &[(String, String)]) -> Result<RawPayload, PageError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url, params).await {
                Err(PageError::Fetch(e)) if attempt < self.policy.fetch_retries => {
                    attempt += 1;
                    let delay = self.backoff(attempt);
                    debug!(
                        "[{}] retry {} for {} in {:?}: {}",
                        self.source.id, attempt, url, delay, e
                    );
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(PageError::Cancelled),
                        _ = sleep(delay) => {}
                    }
                }
                other => return other,
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.policy.retry_delay.saturating_mul(attempt);
        let spread = (base.as_millis() as u64) / 4;
        let jitter = if spread == 0 {
            0
        } else {
            rand::rng().random_range(0..=spread)
        };
        base + Duration::from_millis(jitter)
    }

    /// Fetches the vacancy's own page for sources whose listings carry no description.
    /// The flag is set when cancellation cut the pass short.
    async fn fill_descriptions(&self, mut vacancies: Vec<Vacancy>) -> (Vec<Vacancy>, bool) {
        if !self.parser.has_detail_pages() {
            return (vacancies, false);
        }

        for vacancy in vacancies.iter_mut().filter(|v| v.description.is_empty()) {
            match self.fetch_once(&vacancy.url, &[]).await {
                Ok(payload) => {
                    if let Some(text) = self.parser.parse_detail(&payload) {
                        vacancy.description = text;
                    }
                }
                Err(PageError::Fetch(e)) => {
                    warn!("[{}] detail page unavailable: {}", self.source.id, e);
                }
                Err(PageError::Cancelled) => return (vacancies, true),
            }
        }
        (vacancies, false)
    }

    fn cancelled(&self, batch: SourceBatch) -> ScrapeOutcome {
        warn!(
            "[{}] cancelled after {} page(s), keeping {} vacancies",
            self.source.id,
            batch.pages_fetched,
            batch.vacancies.len()
        );
        ScrapeOutcome::Failed {
            error: ScrapeError::Cancelled {
                pages_fetched: batch.pages_fetched,
            },
            partial: batch,
        }
    }
}
