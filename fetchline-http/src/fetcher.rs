use std::ops::Deref;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinSet;
use tokio::time::{sleep, Instant};

use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::gate::ConcurrencyGate;
use crate::rate::RateLimiter;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::session::{FetchSession, Transport};
use crate::types::{FetchAttemptResult, FetchResult};

// ==============================
// Fetcher
// ==============================

/// Bounded, rate-limited, retrying URL fetcher.
///
/// Cloning is cheap and every clone shares the same limiter, gate and
/// session slot, so limits apply across all clones.
#[derive(Clone)]
pub struct Fetcher {
    inner: Arc<Shared>,
}

struct Shared {
    config: FetcherConfig,
    limiter: RateLimiter,
    gate: ConcurrencyGate,
    policy: RetryPolicy,
    session: Mutex<Option<Arc<FetchSession>>>,
}

impl Fetcher {
    /// Validate `config` and build a fetcher with no open session.
    ///
    /// ```
    /// use fetchline_http::{Fetcher, FetcherConfig};
    ///
    /// let fetcher = Fetcher::new(FetcherConfig::default()).unwrap();
    /// assert!(!fetcher.is_open());
    /// assert!(Fetcher::new(FetcherConfig::default().with_max_retries(0)).is_err());
    /// ```
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        config.validate()?;
        let limiter = RateLimiter::new(config.min_interval(), config.rate_limiting_disabled);
        let gate = ConcurrencyGate::new(config.max_concurrent);
        let policy = RetryPolicy::new(config.max_retries, config.backoff_unit);
        Ok(Self {
            inner: Arc::new(Shared {
                config,
                limiter,
                gate,
                policy,
                session: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.inner.config
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.inner.gate
    }

    pub fn is_open(&self) -> bool {
        self.slot().is_some()
    }

    // ==============================
    // Session scope
    // ==============================

    /// Open a reqwest-backed session. The session lives until the returned
    /// guard is closed or dropped.
    pub fn open(&self) -> Result<SessionGuard, FetchError> {
        let session = FetchSession::open(&self.inner.config)?;
        self.install(session)
    }

    /// Open a session over a caller-supplied transport.
    pub fn open_with(&self, transport: Arc<dyn Transport>) -> Result<SessionGuard, FetchError> {
        self.install(FetchSession::with_transport(transport))
    }

    fn install(&self, session: FetchSession) -> Result<SessionGuard, FetchError> {
        let mut slot = self.slot();
        if slot.is_some() {
            return Err(FetchError::SessionAlreadyOpen);
        }
        *slot = Some(Arc::new(session));
        drop(slot);

        let cfg = &self.inner.config;
        tracing::info!(
            max_retries = cfg.max_retries,
            requests_per_second = cfg.requests_per_second,
            max_concurrent = cfg.max_concurrent,
            timeout_ms = cfg.request_timeout.as_millis() as u64,
            rate_limiting_disabled = cfg.rate_limiting_disabled,
            "fetch.session.open"
        );
        Ok(SessionGuard {
            fetcher: self.clone(),
        })
    }

    fn release_session(&self) {
        if self.slot().take().is_some() {
            tracing::info!("fetch.session.close");
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Arc<FetchSession>>> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn current_session(&self) -> Result<Arc<FetchSession>, FetchError> {
        self.slot().clone().ok_or(FetchError::SessionNotOpen)
    }

    // ==============================
    // Fetching
    // ==============================

    /// Fetch one URL. Network failures are reported inside the result;
    /// `Err` means no session was open.
    pub async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let session = self.current_session()?;
        self.run(session, url).await
    }

    /// Fetch every URL concurrently, returning results in input order.
    ///
    /// Launches are spaced by the minimum interval unless rate limiting is
    /// disabled. Dropping the returned future aborts the outstanding tasks.
    pub async fn fetch_all<I, S>(&self, urls: I) -> Result<Vec<FetchResult>, FetchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let session = self.current_session()?;
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        let stagger = (!self.inner.limiter.is_disabled()).then(|| self.inner.limiter.min_interval());

        tracing::debug!(count = urls.len(), stagger_ms = ?stagger.map(|d| d.as_millis() as u64), "fetch.batch.start");

        let mut tasks = JoinSet::new();
        for (idx, url) in urls.iter().enumerate() {
            if idx > 0 {
                if let Some(gap) = stagger {
                    sleep(gap).await;
                }
            }
            let fetcher = self.clone();
            let session = session.clone();
            let url = url.clone();
            tasks.spawn(async move { (idx, fetcher.run(session, &url).await) });
        }

        let mut slots: Vec<Option<FetchResult>> = vec![None; urls.len()];
        while let Some(joined) = tasks.join_next().await {
            let (idx, result) = joined.map_err(|e| FetchError::Task(e.to_string()))?;
            slots[idx] = Some(result?);
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.ok_or_else(|| FetchError::Task(format!("no result for {}", urls[idx])))
            })
            .collect()
    }

    /// One URL's retry loop, holding a single gate permit throughout.
    async fn run(&self, session: Arc<FetchSession>, url: &str) -> Result<FetchResult, FetchError> {
        let _permit = self.inner.gate.acquire().await?;
        let policy = self.inner.policy;
        let mut attempt_number = 1u32;

        loop {
            // Only new requests queue on the limiter; retries ride on backoff.
            if attempt_number == 1 {
                self.inner.limiter.await_turn().await;
            }

            tracing::debug!(
                url = %url,
                attempt = attempt_number,
                max_retries = policy.max_attempts(),
                "fetch.attempt.start"
            );

            let t0 = Instant::now();
            let attempt = match session.transport().get(url).await {
                Ok(resp) => FetchAttemptResult::from_response(resp, attempt_number),
                Err(err) => FetchAttemptResult::from_transport_error(&err, attempt_number),
            };
            let duration_ms = t0.elapsed().as_millis() as u64;

            match policy.decide(&attempt) {
                RetryDecision::Succeeded => {
                    tracing::debug!(
                        url = %url,
                        attempt = attempt_number,
                        duration_ms,
                        body_len = attempt.body.len(),
                        "fetch.success"
                    );
                    return Ok(attempt.into_result(url));
                }
                RetryDecision::Retry { after } => {
                    tracing::warn!(
                        url = %url,
                        status = ?attempt.http_status,
                        kind = ?attempt.error_kind,
                        attempt = attempt_number,
                        max_retries = policy.max_attempts(),
                        backoff_ms = after.as_millis() as u64,
                        duration_ms,
                        "fetch.retrying"
                    );
                    sleep(after).await;
                    attempt_number += 1;
                }
                RetryDecision::GiveUp => {
                    let result = attempt.into_result(url);
                    tracing::warn!(
                        url = %url,
                        status = result.status,
                        kind = ?result.error_kind,
                        attempt = attempt_number,
                        error = result.error.as_deref().unwrap_or("-"),
                        "fetch.error"
                    );
                    return Ok(result);
                }
            }
        }
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("config", &self.inner.config)
            .field("open", &self.is_open())
            .finish()
    }
}

// ==============================
// Scope guard
// ==============================

/// Keeps the fetcher's session open; closing or dropping it releases the
/// transport on every exit path, including unwinding and cancellation.
///
/// Derefs to the [`Fetcher`] so fetches can go through the guard directly.
#[must_use = "the session closes as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SessionGuard {
    fetcher: Fetcher,
}

impl SessionGuard {
    /// Close the session now.
    pub fn close(self) {
        drop(self);
    }
}

impl Deref for SessionGuard {
    type Target = Fetcher;

    fn deref(&self) -> &Fetcher {
        &self.fetcher
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.fetcher.release_session();
    }
}
