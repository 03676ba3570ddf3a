use std::time::Duration;

use crate::error::FetchError;

/// Longest spacing between request starts (one year).
const MAX_MIN_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Immutable settings for a [`crate::Fetcher`].
///
/// ```
/// use fetchline_http::FetcherConfig;
/// use std::time::Duration;
///
/// let cfg = FetcherConfig::default()
///     .with_max_retries(5)
///     .with_requests_per_second(4.0);
/// assert_eq!(cfg.max_retries, 5);
/// assert_eq!(cfg.min_interval(), Duration::from_millis(250));
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FetcherConfig {
    /// Attempts per URL, including the first.
    pub max_retries: u32,
    pub requests_per_second: f64,
    /// Size of the permit pool.
    pub max_concurrent: usize,
    /// Total budget for a single network call.
    pub request_timeout: Duration,
    /// Test-only escape hatch: removes all request spacing.
    pub rate_limiting_disabled: bool,
    /// One backoff unit; retry `n` sleeps `2^(n-1)` units.
    pub backoff_unit: Duration,
    pub user_agent: Option<String>,
    pub connect_timeout: Option<Duration>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            requests_per_second: 1.0,
            max_concurrent: 5,
            request_timeout: Duration::from_secs(30),
            rate_limiting_disabled: false,
            backoff_unit: Duration::from_secs(1),
            user_agent: None,
            connect_timeout: None,
        }
    }
}

impl FetcherConfig {
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_requests_per_second(mut self, rate: f64) -> Self {
        self.requests_per_second = rate;
        self
    }

    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.request_timeout = dur;
        self
    }

    pub fn with_rate_limiting_disabled(mut self, disabled: bool) -> Self {
        self.rate_limiting_disabled = disabled;
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    pub fn with_connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    /// Minimum spacing between request starts (`1 / requests_per_second`).
    ///
    /// Saturates to `Duration::MAX` for rates [`validate`](Self::validate) rejects.
    pub fn min_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.requests_per_second).unwrap_or(Duration::MAX)
    }

    /// Reject values the fetcher cannot run with.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.max_retries == 0 {
            return Err(FetchError::InvalidConfig(
                "max_retries must be at least 1".into(),
            ));
        }
        if !self.requests_per_second.is_finite() || self.requests_per_second <= 0.0 {
            return Err(FetchError::InvalidConfig(format!(
                "requests_per_second must be a positive number, got {}",
                self.requests_per_second
            )));
        }
        // The spacing is added to an `Instant`, so it must fit comfortably in one.
        let spacing = Duration::try_from_secs_f64(1.0 / self.requests_per_second)
            .ok()
            .filter(|d| *d <= MAX_MIN_INTERVAL);
        if spacing.is_none() {
            return Err(FetchError::InvalidConfig(format!(
                "requests_per_second {} is too small; the interval between requests must not exceed {} seconds",
                self.requests_per_second,
                MAX_MIN_INTERVAL.as_secs()
            )));
        }
        if self.max_concurrent == 0 {
            return Err(FetchError::InvalidConfig(
                "max_concurrent must be at least 1".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(FetchError::InvalidConfig(
                "request_timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = FetcherConfig::default();
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.requests_per_second, 1.0);
        assert_eq!(cfg.max_concurrent, 5);
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert!(!cfg.rate_limiting_disabled);
        assert_eq!(cfg.backoff_unit, Duration::from_secs(1));
        assert_eq!(cfg.min_interval(), Duration::from_secs(1));
    }

    #[test]
    fn rejects_non_positive_values() {
        assert!(FetcherConfig::default().with_max_retries(0).validate().is_err());
        assert!(FetcherConfig::default().with_max_concurrent(0).validate().is_err());
        assert!(
            FetcherConfig::default()
                .with_requests_per_second(0.0)
                .validate()
                .is_err()
        );
        assert!(
            FetcherConfig::default()
                .with_requests_per_second(f64::NAN)
                .validate()
                .is_err()
        );
        assert!(
            FetcherConfig::default()
                .with_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn rejects_rates_too_small_to_space_requests() {
        let cfg = FetcherConfig::default().with_requests_per_second(1e-20);
        assert!(matches!(cfg.validate(), Err(FetchError::InvalidConfig(_))));
        assert_eq!(cfg.min_interval(), Duration::MAX);
        assert!(crate::Fetcher::new(cfg).is_err());

        // One request a day is still a valid schedule.
        let daily = FetcherConfig::default().with_requests_per_second(1.0 / 86_400.0);
        assert!(daily.validate().is_ok());
        assert!(crate::Fetcher::new(daily).is_ok());
    }
}
