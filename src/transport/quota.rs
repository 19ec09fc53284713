//! Call-limit bucket state parsed from Admin API response headers.

use std::fmt;

/// Bucket usage ratio at which the client pauses before the next request.
pub const QUOTA_THRESHOLD: f64 = 0.8;

/// Snapshot of the store's sliding request bucket.
///
/// Parsed from the `X-Shopify-Shop-Api-Call-Limit` header, which encodes
/// `used/capacity` (e.g. `32/40`). The snapshot is refreshed from every
/// response; the client never decrements `used` locally, only the server can
/// lower it across time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    /// Requests consumed from the current bucket.
    used: u32,

    /// Bucket capacity.
    capacity: u32,
}

impl Quota {
    /// Parses a `used/capacity` header value.
    ///
    /// Returns `None` for malformed values, zero capacity, or `used`
    /// exceeding `capacity` (the bucket invariant).
    #[must_use]
    pub fn parse(header_value: &str) -> Option<Self> {
        let (used, capacity) = header_value.trim().split_once('/')?;
        let used: u32 = used.trim().parse().ok()?;
        let capacity: u32 = capacity.trim().parse().ok()?;
        if capacity == 0 || used > capacity {
            return None;
        }
        Some(Self { used, capacity })
    }

    /// Returns the consumed request count.
    #[must_use]
    pub fn used(&self) -> u32 {
        self.used
    }

    /// Returns the bucket capacity.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns the usage ratio in `[0.0, 1.0]`.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        f64::from(self.used) / f64::from(self.capacity)
    }

    /// Whether usage has reached the proactive-throttle threshold.
    #[must_use]
    pub fn is_near_limit(&self) -> bool {
        self.ratio() >= QUOTA_THRESHOLD
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.used, self.capacity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_header() {
        let quota = Quota::parse("32/40").unwrap();
        assert_eq!(quota.used(), 32);
        assert_eq!(quota.capacity(), 40);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let quota = Quota::parse(" 8 / 40 ").unwrap();
        assert_eq!(quota.used(), 8);
        assert_eq!(quota.capacity(), 40);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Quota::parse("32"), None);
        assert_eq!(Quota::parse("a/b"), None);
        assert_eq!(Quota::parse(""), None);
        assert_eq!(Quota::parse("32/40/2"), None);
    }

    #[test]
    fn test_parse_rejects_zero_capacity() {
        assert_eq!(Quota::parse("0/0"), None);
    }

    #[test]
    fn test_parse_rejects_used_over_capacity() {
        assert_eq!(Quota::parse("41/40"), None);
    }

    #[test]
    fn test_ratio_and_threshold() {
        assert!(!Quota::parse("31/40").unwrap().is_near_limit());
        assert!(Quota::parse("32/40").unwrap().is_near_limit()); // exactly 0.8
        assert!(Quota::parse("40/40").unwrap().is_near_limit());
        assert!(!Quota::parse("0/40").unwrap().is_near_limit());
    }

    #[test]
    fn test_display_round_trips_header_format() {
        let quota = Quota::parse("32/40").unwrap();
        assert_eq!(quota.to_string(), "32/40");
    }
}
