use crate::model::ConfigError;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) VacancyCrawlerBot/0.1";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub sources: Vec<SourceConfig>,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_failure_threshold")]
    pub consecutive_failure_threshold: u32,
    #[serde(default = "default_fetch_retries")]
    pub fetch_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Skill vocabulary; empty falls back to the built-in list.
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub base_url: String,
    /// First listing page; defaults to `base_url`.
    #[serde(default)]
    pub start_url: Option<String>,
    /// Static query parameters sent with every listing request.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub pagination: Option<PaginationConfig>,
    pub format: SourceFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    pub page_param: String,
    #[serde(default = "default_first_page")]
    pub first_page: u32,
    /// Upper bound when the source declares no total, or declares a silly one.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceFormat {
    Html { selectors: HtmlSelectors },
    Json { fields: JsonFieldPaths },
}

/// CSS selectors for a markup source. Fragment-level selectors are relative to `item`.
#[derive(Debug, Clone, Deserialize)]
pub struct HtmlSelectors {
    pub container: String,
    pub item: String,
    pub title: String,
    pub url: String,
    #[serde(default = "default_url_attr")]
    pub url_attr: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    /// Pagination links; the largest number among them is the page count.
    #[serde(default)]
    pub total_pages: Option<String>,
    /// Selector applied to a vacancy's own page to fill an empty description.
    #[serde(default)]
    pub detail_description: Option<String>,
}

/// JSON Pointer paths for a JSON source. Field paths are relative to one listing.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonFieldPaths {
    pub listings: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub posted_at: Option<String>,
    #[serde(default)]
    pub total_pages: Option<String>,
}

fn default_max_concurrency() -> usize {
    4
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_fetch_retries() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_first_page() -> u32 {
    1
}

fn default_max_pages() -> u32 {
    50
}

fn default_url_attr() -> String {
    "href".to_string()
}

impl AppConfig {
    pub fn new(sources: Vec<SourceConfig>) -> Self {
        Self {
            sources,
            max_concurrency: default_max_concurrency(),
            consecutive_failure_threshold: default_failure_threshold(),
            fetch_retries: default_fetch_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            skills: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be at least 1".into()));
        }
        if self.consecutive_failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "consecutive_failure_threshold must be at least 1".into(),
            ));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(ConfigError::Invalid("source id must not be empty".into()));
            }
            if !seen.insert(source.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate source id: {}", source.id)));
            }
        }
        Ok(())
    }
}

impl SourceConfig {
    pub fn start_url(&self) -> &str {
        self.start_url.as_deref().unwrap_or(&self.base_url)
    }

    /// JobBird search results: HTML, numbered pagination.
    pub fn jobbird() -> Self {
        Self {
            id: "jobbird".to_string(),
            base_url: "https://www.jobbird.com".to_string(),
            start_url: Some("https://www.jobbird.com/nl/vacature".to_string()),
            params: BTreeMap::from([
                ("s".to_string(), "java".to_string()),
                ("rad".to_string(), "30".to_string()),
                ("ot".to_string(), "date".to_string()),
            ]),
            pagination: Some(PaginationConfig {
                page_param: "page".to_string(),
                first_page: 1,
                max_pages: default_max_pages(),
            }),
            format: SourceFormat::Html {
                selectors: HtmlSelectors {
                    container: "div.jobResults".to_string(),
                    item: "div.card-vacancy".to_string(),
                    title: "h2.jobTitle".to_string(),
                    url: "a.jobLink".to_string(),
                    url_attr: default_url_attr(),
                    location: Some("span.job-result__place".to_string()),
                    description: Some("p.job-result__description".to_string()),
                    company: Some("span.job-result__company".to_string()),
                    total_pages: Some("ul.pagination li a".to_string()),
                    detail_description: Some("div#jobContent".to_string()),
                },
            },
        }
    }

    /// Yacht vacancy API: JSON, `pages` carries the total page count.
    pub fn yacht() -> Self {
        Self {
            id: "yacht".to_string(),
            base_url: "https://www.yacht.nl".to_string(),
            start_url: Some(
                "https://www.yacht.nl/content/yacht/infra/yacht/vacatureoverzicht.vacancies.json"
                    .to_string(),
            ),
            params: BTreeMap::from([("query".to_string(), "java".to_string())]),
            pagination: Some(PaginationConfig {
                page_param: "page".to_string(),
                first_page: 1,
                max_pages: default_max_pages(),
            }),
            format: SourceFormat::Json {
                fields: JsonFieldPaths {
                    listings: "/vacancies".to_string(),
                    title: "/title".to_string(),
                    url: "/detailUrl".to_string(),
                    location: Some("/meta/location".to_string()),
                    description: Some("/summary".to_string()),
                    company: Some("/meta/company".to_string()),
                    posted_at: Some("/meta/publishDate".to_string()),
                    total_pages: Some("/pages".to_string()),
                },
            },
        }
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
