//! Scraping and normalization core for a job-vacancy aggregator.
//!
//! [`ScrapeOrchestrator::run`] is the entry point: given configured sources it
//! returns, per source id, either the normalized vacancies found there or an
//! explicit failure carrying whatever was gathered before it.

pub mod config;
pub mod model;
pub mod normalizer;
pub mod orchestrator;
pub mod parser;
pub mod scraper;
pub mod skills;
pub mod utils;

pub use config::{load_config, AppConfig, SourceConfig};
pub use model::{FetchError, ParseError, ScrapeError, ScrapeOutcome, SourceBatch, Vacancy};
pub use orchestrator::ScrapeOrchestrator;
pub use skills::SkillVocabulary;
