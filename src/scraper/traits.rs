use crate::model::{FetchError, RawPayload};

/// One outbound GET per call. Implementations never retry.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, params: &[(String, String)]) -> Result<RawPayload, FetchError>;
}
