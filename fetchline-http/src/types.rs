use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{FetchErrorKind, TransportError};

/// Response headers keyed by lowercase header name.
pub type Headers = BTreeMap<String, String>;

/// Status reported when no HTTP response was obtained on the last attempt.
pub const TRANSPORT_FAILURE_STATUS: u16 = 500;

/// The one status code treated as success.
pub const SUCCESS_STATUS: u16 = 200;

/// What the transport hands back for a completed call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: String,
}

/// Outcome of one attempt inside a URL's retry loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchAttemptResult {
    /// `None` when the transport failed before a response arrived.
    pub http_status: Option<u16>,
    pub body: String,
    pub headers: Headers,
    /// 1-based.
    pub attempt_number: u32,
    pub error_kind: Option<FetchErrorKind>,
}

impl FetchAttemptResult {
    pub fn from_response(resp: TransportResponse, attempt_number: u32) -> Self {
        let error_kind = (resp.status != SUCCESS_STATUS).then_some(FetchErrorKind::HttpError);
        Self {
            http_status: Some(resp.status),
            body: resp.body,
            headers: resp.headers,
            attempt_number,
            error_kind,
        }
    }

    pub fn from_transport_error(err: &TransportError, attempt_number: u32) -> Self {
        Self {
            http_status: None,
            body: err.to_string(),
            headers: Headers::new(),
            attempt_number,
            error_kind: Some(err.kind()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.http_status == Some(SUCCESS_STATUS)
    }

    /// Turn the last attempt of a loop into the caller-facing result.
    pub fn into_result(self, url: &str) -> FetchResult {
        let error = match (self.is_success(), self.http_status) {
            (true, _) => None,
            (false, Some(status)) => Some(format!("HTTP {status}")),
            (false, None) => Some(self.body.clone()),
        };
        FetchResult {
            url: url.to_string(),
            status: self.http_status.unwrap_or(TRANSPORT_FAILURE_STATUS),
            content: self.body,
            headers: self.headers,
            attempt: self.attempt_number,
            error,
            error_kind: self.error_kind,
        }
    }
}

/// Result for one URL, always returned as data even when every attempt failed.
///
/// ```
/// use fetchline_http::FetchResult;
///
/// let json = r#"{"url":"https://example.com","status":200,"content":"ok","headers":{},"attempt":1}"#;
/// let result: FetchResult = serde_json::from_str(json).unwrap();
/// assert!(result.is_success());
/// assert!(result.error.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub url: String,
    /// HTTP status of the last attempt, or 500 after a transport failure.
    pub status: u16,
    /// Body of the last attempt, or the transport error's description.
    pub content: String,
    pub headers: Headers,
    /// Attempts actually made.
    pub attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FetchErrorKind>,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counts over a batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub http_errors: usize,
    pub timeouts: usize,
    pub connection_errors: usize,
    pub total_attempts: u64,
}

impl FetchSummary {
    pub fn from_results(results: &[FetchResult]) -> Self {
        let mut summary = FetchSummary {
            total: results.len(),
            ..Default::default()
        };
        for r in results {
            summary.total_attempts += u64::from(r.attempt);
            match r.error_kind {
                _ if r.is_success() => summary.succeeded += 1,
                Some(FetchErrorKind::Timeout) => summary.timeouts += 1,
                Some(FetchErrorKind::ConnectionError) => summary.connection_errors += 1,
                Some(FetchErrorKind::HttpError) | None => summary.http_errors += 1,
            }
        }
        summary
    }

    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }
}
