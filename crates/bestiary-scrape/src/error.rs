use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("rate limit from {0}, retry after {1}s")]
    RateLimit(String, u64),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("empty response from {0}")]
    EmptyBody(String),

    #[error("page not found in corpus: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
