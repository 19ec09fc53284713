//! Error types for the transport module.
//!
//! Structured errors for every way a request against the Admin API can fail,
//! with enough context (URL, status, response body) to retry manually.

use thiserror::Error;

/// Errors surfaced by [`super::ApiClient`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response other than 429 (4xx client errors, 5xx server errors).
    ///
    /// These are never retried; only the rate-limit status is.
    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Response body snippet for diagnostics.
        body: String,
    },

    /// The retry budget for 429 rejections was spent without a success.
    #[error("rate limit retries exhausted after {tries} tries requesting {url}")]
    QuotaExhausted {
        /// The URL that kept being rejected.
        url: String,
        /// Total tries made, including the initial attempt.
        tries: u32,
    },

    /// Malformed or unexpected response shape (unparseable JSON, missing
    /// expected fields). Fatal for the current operation, not retried.
    #[error("protocol error: {context}")]
    Protocol {
        /// What was expected and where.
        context: String,
    },

    /// The GraphQL endpoint returned a top-level `errors` array.
    #[error("GraphQL request failed: {errors}")]
    Graphql {
        /// Serialized error payload from the server.
        errors: String,
    },
}

impl TransportError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Creates a quota-exhausted error.
    pub fn quota_exhausted(url: impl Into<String>, tries: u32) -> Self {
        Self::QuotaExhausted {
            url: url.into(),
            tries,
        }
    }

    /// Creates a protocol error.
    pub fn protocol(context: impl Into<String>) -> Self {
        Self::Protocol {
            context: context.into(),
        }
    }

    /// Creates a GraphQL-errors error from the server payload.
    pub fn graphql(errors: &serde_json::Value) -> Self {
        Self::Graphql {
            errors: errors.to_string(),
        }
    }
}
