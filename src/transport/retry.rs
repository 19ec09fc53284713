//! Bounded retry policy for 429 rate-limit rejections.
//!
//! Only the rate-limit status is ever retried; every other failure surfaces
//! immediately. The wait before each retry is a pure function of the
//! response: the server-advised `Retry-After` value when present and
//! parseable, otherwise a fixed fallback.

use std::time::Duration;

use tracing::{debug, warn};

/// Total tries per request (initial attempt plus 5 retries).
pub const RATE_LIMIT_MAX_TRIES: u32 = 6;

/// Fallback wait when a 429 carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(2);

/// Maximum honored Retry-After value (1 hour) to prevent excessive delays.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Policy governing 429 retry behavior.
#[derive(Debug, Clone)]
pub struct ThrottlePolicy {
    /// Total tries, including the initial attempt (must be >= 1).
    max_tries: u32,

    /// Wait applied when the server advises none.
    fallback: Duration,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_tries: RATE_LIMIT_MAX_TRIES,
            fallback: DEFAULT_RETRY_AFTER,
        }
    }
}

impl ThrottlePolicy {
    /// Creates a policy with a custom try budget and fallback wait.
    #[must_use]
    pub fn new(max_tries: u32, fallback: Duration) -> Self {
        Self {
            max_tries: max_tries.max(1),
            fallback,
        }
    }

    /// Returns the total try budget.
    #[must_use]
    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    /// Returns the wait before the next retry for a 429 response.
    ///
    /// Uses the advertised `Retry-After` value when parseable, otherwise the
    /// fixed fallback.
    #[must_use]
    pub fn backoff(&self, retry_after: Option<&str>) -> Duration {
        match retry_after.and_then(parse_retry_after) {
            Some(advised) => advised,
            None => {
                debug!(
                    fallback_secs = self.fallback.as_secs(),
                    "no usable Retry-After, using fallback"
                );
                self.fallback
            }
        }
    }
}

/// Parses a Retry-After header value into a Duration.
///
/// Supports two formats as per RFC 7231:
/// - Integer seconds: `Retry-After: 120`
/// - HTTP-date: `Retry-After: Wed, 21 Oct 2026 07:28:00 GMT`
///
/// Returns `None` if the value cannot be parsed. Caps excessive values at
/// 1 hour.
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    // Integer seconds first (most common)
    if let Ok(seconds) = header_value.parse::<i64>() {
        if seconds < 0 {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        }

        #[allow(clippy::cast_sign_loss)]
        let duration = Duration::from_secs(seconds as u64);

        if duration > MAX_RETRY_AFTER {
            warn!(
                seconds,
                max_seconds = MAX_RETRY_AFTER.as_secs(),
                "Retry-After exceeds maximum, capping at 1 hour"
            );
            return Some(MAX_RETRY_AFTER);
        }

        return Some(duration);
    }

    // HTTP-date form
    if let Ok(datetime) = httpdate::parse_http_date(header_value) {
        let now = std::time::SystemTime::now();

        if let Ok(duration) = datetime.duration_since(now) {
            if duration > MAX_RETRY_AFTER {
                warn!(
                    delay_secs = duration.as_secs(),
                    max_secs = MAX_RETRY_AFTER.as_secs(),
                    "Retry-After date exceeds maximum, capping at 1 hour"
                );
                return Some(MAX_RETRY_AFTER);
            }
            Some(duration)
        } else {
            debug!(
                header_value,
                "Retry-After date is in the past, returning zero"
            );
            Some(Duration::ZERO)
        }
    } else {
        debug!(header_value, "unparseable Retry-After value");
        None
    }
}
