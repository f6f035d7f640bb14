//! Failure taxonomy for a yield cycle.
//!
//! Every variant aborts the whole cycle. Missing prices and unmatched prior
//! snapshots are not errors: they travel as `None` through the calculators and
//! are settled by the final pool filter.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, YieldError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum YieldError {
    /// The slowest indexer lags the time-resolved head by more than the chain threshold.
    #[error(
        "Stale subgraph on {chain}: {delta} blocks behind (resolved {resolved}, indexed {indexed}, threshold {threshold})"
    )]
    StaleData {
        chain: String,
        resolved: u64,
        indexed: u64,
        delta: u64,
        threshold: u64,
    },

    #[error("{service} request failed: {source}")]
    Upstream {
        service: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("{service} returned a malformed response: {detail}")]
    MalformedResponse {
        service: &'static str,
        detail: String,
    },

    #[error("No indexer endpoint configured")]
    NoIndexer,
}

impl YieldError {
    pub fn upstream<E>(service: &'static str, err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Upstream {
            service,
            source: err.into(),
        }
    }

    pub fn malformed(service: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            service,
            detail: detail.into(),
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleData { .. })
    }
}
