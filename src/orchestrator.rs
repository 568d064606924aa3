//! Runs every configured source concurrently and gathers one outcome per source.
//!
//! Each source gets its own task, bounded by a semaphore. Tasks share only the
//! fetcher and the read-only skill vocabulary; every task accumulates into its
//! own batch, and enrichment and deduplication happen per source after the
//! pages are in.

use crate::config::{AppConfig, SourceConfig};
use crate::model::{FetchError, ScrapeError, ScrapeOutcome, SourceBatch};
use crate::normalizer::merge;
use crate::parser::build_parser;
use crate::scraper::fetcher::HttpFetcher;
use crate::scraper::pagination::{PageCollector, PaginationPolicy};
use crate::scraper::traits::Fetcher;
use crate::skills::SkillVocabulary;

use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const DEFAULT_MAX_CONCURRENCY: usize = 4;

pub struct ScrapeOrchestrator {
    fetcher: Arc<dyn Fetcher>,
    vocabulary: Arc<SkillVocabulary>,
    policy: PaginationPolicy,
    max_concurrency: usize,
}

impl ScrapeOrchestrator {
    pub fn new(fetcher: Arc<dyn Fetcher>, vocabulary: Arc<SkillVocabulary>) -> Self {
        Self {
            fetcher,
            vocabulary,
            policy: PaginationPolicy::from(&AppConfig::new(Vec::new())),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// HTTP fetcher, vocabulary, retry policy and concurrency bound all taken from `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        let fetcher = Arc::new(HttpFetcher::new(config)?);
        let vocabulary = Arc::new(SkillVocabulary::from_config(&config.skills));
        Ok(Self::new(fetcher, vocabulary)
            .with_policy(PaginationPolicy::from(config))
            .with_max_concurrency(config.max_concurrency))
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PaginationPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Scrapes every source and returns one outcome per source id. A failing
    /// source never affects the others. Cancelling `cancel` stops further
    /// requests; sources then report their partial batch as cancelled.
    pub async fn run(
        &self,
        sources: &[SourceConfig],
        cancel: &CancellationToken,
    ) -> BTreeMap<String, ScrapeOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut outcomes = BTreeMap::new();
        let mut ids = Vec::new();
        let mut tasks = Vec::new();

        info!(
            "Scraping {} source(s), at most {} at a time",
            sources.len(),
            self.max_concurrency
        );

        for source in sources {
            let parser = match build_parser(source) {
                Ok(parser) => parser,
                Err(e) => {
                    error!("[{}] {}", source.id, e);
                    outcomes.insert(
                        source.id.clone(),
                        ScrapeOutcome::Failed {
                            error: e,
                            partial: SourceBatch::new(&source.id),
                        },
                    );
                    continue;
                }
            };

            let semaphore = semaphore.clone();
            let fetcher = self.fetcher.clone();
            let vocabulary = self.vocabulary.clone();
            let policy = self.policy.clone();
            let cancel = cancel.clone();
            let source = source.clone();

            ids.push(source.id.clone());
            tasks.push(tokio::spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };
                let outcome = match permit {
                    Some(_permit) => {
                        PageCollector::new(
                            fetcher.as_ref(),
                            parser.as_ref(),
                            &source,
                            &policy,
                            &cancel,
                        )
                        .collect()
                        .await
                    }
                    None => ScrapeOutcome::Failed {
                        error: ScrapeError::Cancelled { pages_fetched: 0 },
                        partial: SourceBatch::new(&source.id),
                    },
                };
                finish(outcome, &vocabulary)
            }));
        }

        for (id, joined) in ids.into_iter().zip(join_all(tasks).await) {
            let outcome = joined.unwrap_or_else(|e| {
                error!("[{}] scrape task panicked: {}", id, e);
                ScrapeOutcome::Failed {
                    error: ScrapeError::Aborted(e.to_string()),
                    partial: SourceBatch::new(&id),
                }
            });
            log_outcome(&outcome);
            outcomes.insert(id, outcome);
        }

        outcomes
    }
}

/// Attaches skills, then collapses duplicates within the source.
fn finish(outcome: ScrapeOutcome, vocabulary: &SkillVocabulary) -> ScrapeOutcome {
    outcome.map_batch(|mut batch| {
        let enriched = batch
            .vacancies
            .into_iter()
            .map(|v| vocabulary.enrich(v))
            .collect();
        batch.vacancies = merge(enriched);
        batch
    })
}

fn log_outcome(outcome: &ScrapeOutcome) {
    let batch = outcome.batch();
    match outcome.error() {
        None => info!(
            "[{}] {} vacancies, {} skipped fragment(s), {} failed page(s)",
            batch.source,
            batch.vacancies.len(),
            batch.skipped,
            batch.failed_pages
        ),
        Some(e) => warn!(
            "[{}] failed with {} vacancies kept: {}",
            batch.source,
            batch.vacancies.len(),
            e
        ),
    }
}
