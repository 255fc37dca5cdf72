//! Error types for providers, the cost cache and the planning pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A single failed request to an external geocoding or routing service.
///
/// These never escape the retry and fallback logic; they exist so each
/// attempt can be logged with a precise reason.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider}: request timed out after {timeout_secs}s")]
    Timeout {
        provider: &'static str,
        timeout_secs: u64,
    },
    #[error("{provider}: request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider}: HTTP status {status}")]
    Status { provider: &'static str, status: u16 },
    #[error("{provider}: service reported {code}: {message}")]
    Service {
        provider: &'static str,
        code: String,
        message: String,
    },
    #[error("{provider}: malformed response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
    #[error("{provider}: no match")]
    NoMatch { provider: &'static str },
    #[error("{provider}: returned its unresolved placeholder coordinate")]
    Placeholder { provider: &'static str },
}

impl ProviderError {
    /// Classifies a reqwest failure the way the routing clients report it.
    pub(crate) fn from_reqwest(provider: &'static str, timeout_secs: u64, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return ProviderError::Timeout {
                provider,
                timeout_secs,
            };
        }
        if let Some(status) = error.status() {
            return ProviderError::Status {
                provider,
                status: status.as_u16(),
            };
        }
        if error.is_decode() {
            return ProviderError::Decode {
                provider,
                message: error.to_string(),
            };
        }
        ProviderError::Transport {
            provider,
            source: error,
        }
    }
}

/// Failures reading or writing the persistent cost cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cost cache {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cost cache {path} is not valid: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cost cache {path} has unsupported version {version}")]
    Version { path: PathBuf, version: u32 },
}

/// Conditions that abort a planning run.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("no addresses to plan")]
    EmptyInput,
    #[error("a depot and at least one delivery address are required, got {0} address")]
    TooFewAddresses(usize),
    #[error("missing credentials: set {0}")]
    MissingCredentials(&'static str),
    #[error("depot address could not be geocoded: {address}")]
    DepotUnresolved { address: String },
    #[error("insufficient valid stops: {valid} of {total} addresses could be geocoded")]
    InsufficientStops { valid: usize, total: usize },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("failed to read addresses from {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write route report to {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize route report: {0}")]
    ReportFormat(#[from] serde_json::Error),
}
