use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed fetch attempt.
///
/// ```
/// use fetchline_http::FetchErrorKind;
///
/// let kind = FetchErrorKind::Timeout;
/// assert_eq!(serde_json::to_string(&kind).unwrap(), "\"timeout\"");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// A response arrived but its status was not 200.
    HttpError,
    /// The call exceeded the request timeout.
    Timeout,
    /// The transport could not establish or complete the call.
    ConnectionError,
}

/// Transport-level failure of a single network call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection error: {0}")]
    Connection(String),
}

impl TransportError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            TransportError::Timeout(_) => FetchErrorKind::Timeout,
            TransportError::Connection(_) => FetchErrorKind::ConnectionError,
        }
    }

    /// Map a reqwest failure onto the timeout/connection split.
    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

/// Errors returned to callers of the fetcher.
///
/// Per-URL network failures never show up here; they are reported inside
/// [`crate::FetchResult`]. These variants are contract violations or setup
/// failures.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no fetch session is open; call Fetcher::open first")]
    SessionNotOpen,
    #[error("a fetch session is already open for this fetcher")]
    SessionAlreadyOpen,
    #[error("invalid fetcher config: {0}")]
    InvalidConfig(String),
    #[error("transport build failed: {0}")]
    Build(String),
    #[error("fetch task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_map_to_kinds() {
        assert_eq!(
            TransportError::Timeout("slow".into()).kind(),
            FetchErrorKind::Timeout
        );
        assert_eq!(
            TransportError::Connection("refused".into()).kind(),
            FetchErrorKind::ConnectionError
        );
    }

    #[test]
    fn transport_error_display_keeps_cause() {
        let err = TransportError::Connection("Connection refused".into());
        assert!(err.to_string().contains("Connection refused"));
    }
}
