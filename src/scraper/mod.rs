// Fetching and page walking.

pub mod fetcher;
pub mod pagination;
pub mod traits;

pub use fetcher::HttpFetcher;
pub use pagination::{PageCollector, PaginationPolicy};
pub use traits::Fetcher;
