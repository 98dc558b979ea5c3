//! Error taxonomy for the navigator.
//!
//! None of these errors is fatal. Each one is scoped to the operation that
//! raised it and leaves previously cached state intact:
//!
//! - [`FetchError`]: loading roots or children failed; the caller may retry.
//! - [`SearchError`]: a search request failed; rendered as an empty result set
//!   flagged as failed.
//! - [`PersistenceError`]: writing recents/favorites failed; logged and dropped.

use thiserror::Error;

/// Failure while fetching the root set or a node's children.
///
/// `Clone` so a single in-flight fetch can hand the same outcome to every
/// waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network or service failure.
    #[error("failed to fetch {target}: {message}")]
    Transport { target: String, message: String },

    /// The response could not be decoded.
    #[error("invalid response for {target}: {message}")]
    Decode { target: String, message: String },

    /// The request did not complete within the configured timeout.
    #[error("timed out fetching {target} after {timeout_ms} ms")]
    Timeout { target: String, timeout_ms: u64 },

    /// The code is not present in the cached tree.
    #[error("unknown classification code: {code}")]
    UnknownNode { code: String },

    /// A returned child does not name the requested node as its parent.
    #[error("child {child} of {parent} reports parent {found:?}")]
    ParentMismatch {
        parent: String,
        child: String,
        found: Option<String>,
    },
}

impl FetchError {
    pub fn transport(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn decode(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Short message suitable for display next to the tree.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => {
                "Could not load classifications. Check your connection and try again.".to_string()
            }
            Self::Decode { .. } | Self::ParentMismatch { .. } => {
                "The tariff service returned an unexpected response.".to_string()
            }
            Self::UnknownNode { code } => format!("Classification {code} is not available."),
        }
    }
}

/// Failure while running a search request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("search request for {query:?} failed: {message}")]
    Transport { query: String, message: String },

    #[error("invalid search response for {query:?}: {message}")]
    Decode { query: String, message: String },

    #[error("search for {query:?} timed out after {timeout_ms} ms")]
    Timeout { query: String, timeout_ms: u64 },
}

impl SearchError {
    pub fn transport(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            query: query.into(),
            message: message.into(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout { .. } => "Search is taking too long. Try again.".to_string(),
            Self::Transport { .. } | Self::Decode { .. } => "Search failed. Try again.".to_string(),
        }
    }
}

/// Failure reading or writing durable key-value storage.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to {operation} {key}")]
    Io {
        operation: &'static str,
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {key}")]
    Serialization {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to deserialize {key}")]
    Deserialization {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PersistenceError {
    pub fn io(operation: &'static str, key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            key: key.into(),
            source,
        }
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;
