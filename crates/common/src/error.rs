use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Upstream answered but the answer is unusable: non-2xx status, malformed
    /// payload, unparsable numbers.
    #[error("Market data error: {0}")]
    Fetch(String),

    /// Transport failure: connect, timeout, TLS, body read.
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
