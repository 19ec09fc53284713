//! Rate-limited HTTP transport for the Shopify Admin API.
//!
//! This module provides the [`ApiClient`] which executes one request at a
//! time against a store's Admin API, observing the call-limit header on every
//! response, pausing proactively when the quota bucket runs hot, and retrying
//! 429 rejections with the server-advised delay.
//!
//! # Overview
//!
//! - Quota observation: `X-Shopify-Shop-Api-Call-Limit: used/capacity` is
//!   parsed from every non-429 response into a process-wide [`Quota`].
//! - Proactive throttling: at 80% bucket usage the client sleeps a fixed
//!   short pause before handing the response back.
//! - 429 recovery: bounded retries honoring `Retry-After` (2s fallback);
//!   callers never observe a 429 status, only success or
//!   [`TransportError::QuotaExhausted`].
//!
//! # Example
//!
//! ```no_run
//! use shopsync_core::config::StoreConfig;
//! use shopsync_core::transport::ApiClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(StoreConfig::new("mystore", "shpat_secret"));
//! let response = client.get(&client.config().rest_url("shop.json")).await?;
//! println!("HTTP {}", response.status());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
pub mod quota;
pub mod retry;

pub use client::{ApiClient, ApiResponse, CALL_LIMIT_HEADER, THROTTLE_PAUSE};
pub use error::TransportError;
pub use quota::{QUOTA_THRESHOLD, Quota};
pub use retry::{DEFAULT_RETRY_AFTER, RATE_LIMIT_MAX_TRIES, ThrottlePolicy, parse_retry_after};
