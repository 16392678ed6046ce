pub mod flight;
pub mod query;
pub mod routing;

use std::time::Duration;

use routing::DateStatus;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("{message}")]
    DateOutOfRange { status: DateStatus, message: String },
    #[error("Provider rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },
    #[error("Upstream provider unavailable: {0}")]
    UpstreamUnavailable(String),
}

pub type SearchResult<T> = Result<T, SearchError>;
