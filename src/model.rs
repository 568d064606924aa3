// Core structs: Vacancy, parsed pages, per-source outcomes and the error taxonomy
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Vacancy {
    pub title: String,
    pub location: String,
    pub url: String,
    pub broker: String,
    pub company: String,
    pub description: String,
    pub skills: BTreeSet<String>,
    pub posted_at: Option<NaiveDate>,
    pub fetched_at: DateTime<Utc>,
}

impl Vacancy {
    pub fn new(title: String, url: String, broker: &str) -> Self {
        Self {
            title,
            location: String::new(),
            url,
            broker: broker.to_string(),
            company: String::new(),
            description: String::new(),
            skills: BTreeSet::new(),
            posted_at: None,
            fetched_at: Utc::now(),
        }
    }

    /// A record with neither a title nor a link carries nothing worth handing over.
    pub fn is_emittable(&self) -> bool {
        !(self.title.is_empty() && self.url.is_empty())
    }
}

/// Raw body returned by a single fetch, HTML text or JSON.
#[derive(Debug, Clone)]
pub struct RawPayload {
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// What one parser call produced for one page.
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    pub vacancies: Vec<Vacancy>,
    /// Fragments dropped because a required field was missing.
    pub skipped: usize,
    /// Listing fragments seen on the page, kept or skipped.
    pub fragments: usize,
    /// Total page count when the page declares one.
    pub total_pages: Option<u32>,
}

/// Accumulated result for one source, complete or partial.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBatch {
    pub source: String,
    pub vacancies: Vec<Vacancy>,
    pub skipped: usize,
    pub pages_fetched: u32,
    pub failed_pages: u32,
}

impl SourceBatch {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    Collected(SourceBatch),
    Failed {
        error: ScrapeError,
        partial: SourceBatch,
    },
}

impl ScrapeOutcome {
    pub fn batch(&self) -> &SourceBatch {
        match self {
            Self::Collected(batch) => batch,
            Self::Failed { partial, .. } => partial,
        }
    }

    pub fn vacancies(&self) -> &[Vacancy] {
        &self.batch().vacancies
    }

    pub fn error(&self) -> Option<&ScrapeError> {
        match self {
            Self::Collected(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    pub fn is_collected(&self) -> bool {
        matches!(self, Self::Collected(_))
    }

    /// Applies `f` to the batch, complete or partial, keeping the failure marker.
    pub fn map_batch(self, f: impl FnOnce(SourceBatch) -> SourceBatch) -> Self {
        match self {
            Self::Collected(batch) => Self::Collected(f(batch)),
            Self::Failed { error, partial } => Self::Failed {
                error,
                partial: f(partial),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned an empty body")]
    EmptyBody { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("structure mismatch for source {source_id}: expected {expected} ({detail})")]
    StructureMismatch {
        source_id: String,
        expected: String,
        detail: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    #[error("source unreachable: {0}")]
    Fetch(#[from] FetchError),

    #[error("source format changed: {0}")]
    Structure(#[from] ParseError),

    #[error("scrape cancelled after {pages_fetched} page(s)")]
    Cancelled { pages_fetched: u32 },

    #[error("source {source_id} is misconfigured: {reason}")]
    InvalidSource { source_id: String, reason: String },

    #[error("scrape task aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot decode config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
