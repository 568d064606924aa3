#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vacancy_crawler::config::{JsonFieldPaths, PaginationConfig, SourceConfig, SourceFormat};
use vacancy_crawler::model::{FetchError, RawPayload};
use vacancy_crawler::scraper::{Fetcher, PaginationPolicy};

#[derive(Clone)]
pub enum Reply {
    Body(String),
    Status(u16),
}

/// Serves canned replies keyed by `url?k=v&k=v`; unknown keys answer 404.
/// A key with several replies serves them in order and then repeats the last.
#[derive(Default)]
pub struct MemoryFetcher {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
    delay: Duration,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, key: &str, body: &str) -> Self {
        self.push(key, Reply::Body(body.to_string()))
    }

    pub fn fail(self, key: &str, status: u16) -> Self {
        self.push(key, Reply::Status(status))
    }

    fn push(self, key: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Cancels `token` once `calls` requests have been answered.
    pub fn cancel_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

pub fn request_key(url: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{}?{}", url, query.join("&"))
}

#[async_trait::async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, url: &str, params: &[(String, String)]) -> Result<RawPayload, FetchError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let key = request_key(url, params);
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        let answered = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(key);
            calls.len()
        };
        if let Some((limit, token)) = &self.cancel_after {
            if answered >= *limit {
                token.cancel();
            }
        }

        match reply {
            Some(Reply::Body(body)) => Ok(RawPayload {
                url: url.to_string(),
                status: 200,
                body,
            }),
            Some(Reply::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

pub fn quick_policy() -> PaginationPolicy {
    PaginationPolicy {
        consecutive_failure_threshold: 3,
        fetch_retries: 0,
        retry_delay: Duration::from_millis(1),
    }
}

/// JSON source at `https://{id}.example/api`, paged with `page=N`.
pub fn json_source(id: &str) -> SourceConfig {
    SourceConfig {
        id: id.to_string(),
        base_url: format!("https://{}.example", id),
        start_url: Some(format!("https://{}.example/api", id)),
        params: Default::default(),
        pagination: Some(PaginationConfig {
            page_param: "page".to_string(),
            first_page: 1,
            max_pages: 10,
        }),
        format: SourceFormat::Json {
            fields: JsonFieldPaths {
                listings: "/vacancies".to_string(),
                title: "/title".to_string(),
                url: "/url".to_string(),
                location: Some("/location".to_string()),
                description: Some("/description".to_string()),
                company: None,
                posted_at: None,
                total_pages: Some("/totalPages".to_string()),
            },
        },
    }
}

pub fn page_key(id: &str, page: u32) -> String {
    format!("https://{}.example/api?page={}", id, page)
}
