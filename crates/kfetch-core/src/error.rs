//! Error type returned by the dataset client and fetcher.

use std::path::PathBuf;

/// Coarse classification of a fetch failure.
///
/// Callers that only care about "why did it fail" (network, auth, missing
/// dataset) match on this instead of the full `FetchError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport-level failure (DNS, connect, timeout, TLS, reset).
    Network,
    /// The service rejected our credentials (401/403).
    Authentication,
    /// The dataset or version does not exist (404).
    NotFound,
    /// Anything else: local disk, bad archive, bad handle, unexpected HTTP status.
    Other,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid dataset handle {handle:?}: {reason}")]
    InvalidHandle { handle: String, reason: &'static str },

    #[error("network error while requesting {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: curl::Error,
    },

    #[error("authentication rejected (HTTP {status}) for {url}; check KAGGLE_USERNAME/KAGGLE_KEY or kaggle.json")]
    Authentication { url: String, status: u32 },

    #[error("not found (HTTP 404): {url}")]
    NotFound { url: String },

    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u32 },

    #[error("unexpected response from {url}: {reason}")]
    Protocol { url: String, reason: String },

    #[error("credentials file {path}: {reason}")]
    Credentials { path: PathBuf, reason: String },

    #[error("storage: {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("archive {path}: {reason}")]
    Archive { path: PathBuf, reason: String },
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Network { .. } => ErrorKind::Network,
            FetchError::Authentication { .. } => ErrorKind::Authentication,
            FetchError::NotFound { .. } => ErrorKind::NotFound,
            FetchError::InvalidHandle { .. }
            | FetchError::Http { .. }
            | FetchError::Protocol { .. }
            | FetchError::Credentials { .. }
            | FetchError::Storage { .. }
            | FetchError::Archive { .. } => ErrorKind::Other,
        }
    }

    /// Wrap an I/O error with a short description of what we were doing.
    pub(crate) fn storage(context: impl Into<String>, source: std::io::Error) -> Self {
        FetchError::Storage {
            context: context.into(),
            source,
        }
    }
}
