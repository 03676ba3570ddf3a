//! Bounded concurrent web fetcher with rate limiting and retries.
//!
//! - Global concurrency cap: a permit is held for a URL's whole retry loop
//! - Minimum spacing between request starts across the whole fetcher
//! - Retries non-200 responses, timeouts and connection errors with
//!   exponential backoff (1, 2, 4, … units)
//! - Explicit session scope: fetching without an open session is an error
//!
//! Example (no_run):
//! ```rust,no_run
//! # async fn demo() -> Result<(), fetchline_http::FetchError> {
//! use fetchline_http::{Fetcher, FetcherConfig};
//!
//! let fetcher = Fetcher::new(FetcherConfig::default().with_max_concurrent(8))?;
//! let session = fetcher.open()?;
//! let results = session
//!     .fetch_all(["https://example.com", "https://example.org"])
//!     .await?;
//! for r in &results {
//!     println!("{} -> {} (attempts: {})", r.url, r.status, r.attempt);
//! }
//! session.close();
//! # Ok(()) }
//! ```
//!
//! Failures of individual URLs never surface as `Err`: every URL yields a
//! [`FetchResult`] whose `error` field is set when the last attempt was not a
//! 200. `Err` is reserved for contract violations such as fetching without an
//! open session.
//!
//! Observability: structured `tracing` events are emitted for session
//! open/close, attempt start, rate-limit waits, retries (with backoff) and
//! final failures.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod gate;
pub mod rate;
pub mod retry;
pub mod session;
pub mod types;

pub use config::FetcherConfig;
pub use error::{FetchError, FetchErrorKind, TransportError};
pub use fetcher::{Fetcher, SessionGuard};
pub use gate::{ConcurrencyGate, GatePermit};
pub use rate::RateLimiter;
pub use retry::{RetryDecision, RetryPolicy};
pub use session::{FetchSession, ReqwestTransport, Transport};
pub use types::{
    FetchAttemptResult, FetchResult, FetchSummary, Headers, TransportResponse,
    TRANSPORT_FAILURE_STATUS,
};
