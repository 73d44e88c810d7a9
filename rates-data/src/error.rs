use crate::instrument::FeedKind;
use thiserror::Error;

/// All errors generated while fetching and normalising feeds in `rates-data`.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum DataError {
    #[error("transport failure for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("fetch exhausted for {url} after {attempts} attempts: {last}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<DataError>,
    },

    #[error("{feed} response malformed: {source}")]
    Malformed {
        feed: FeedKind,
        source: MalformedResponse,
    },
}

impl DataError {
    /// Determine if an error may be resolved by issuing the same request again.
    ///
    /// Only transport-level failures are retried. A malformed 2xx body is substituted with
    /// fallback values immediately.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::Transport { .. } => true,
            _ => false,
        }
    }

    pub fn malformed(feed: FeedKind, source: MalformedResponse) -> Self {
        Self::Malformed { feed, source }
    }
}

/// Structural validation failures of a 2xx feed body.
///
/// Every oil validation step has its own variant so diagnostics identify which step failed.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum MalformedResponse {
    #[error("body does not match expected schema: {0}")]
    Schema(String),

    #[error("required field missing: {0}")]
    MissingField(&'static str),

    #[error("field {0} is not a positive number")]
    NotPositive(&'static str),

    #[error("observation list missing or not an array")]
    OilSeriesMissing,

    #[error("observation list is empty")]
    OilSeriesEmpty,

    #[error("observation date {0:?} is not a valid date")]
    OilDateInvalid(String),

    #[error("latest observation has no string value")]
    OilValueMissing,

    #[error("could not convert {0:?} into a number")]
    OilValueNotNumeric(String),
}

impl From<serde_json::Error> for MalformedResponse {
    fn from(value: serde_json::Error) -> Self {
        Self::Schema(value.to_string())
    }
}

/// Errors produced while loading a [`BoardConfig`](crate::config::BoardConfig).
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidEnv {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read config file {path}: {reason}")]
    File { path: String, reason: String },

    #[error("fallback value for {instrument} is not numeric: {value:?}")]
    InvalidFallback { instrument: String, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field} must not exceed {max}")]
    TooLarge { field: &'static str, max: u64 },
}
