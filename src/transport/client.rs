//! Rate-limited request execution against the Admin API.
//!
//! This module provides the `ApiClient` struct which executes one HTTP
//! request at a time, observes the call-limit header on every response, and
//! recovers from 429 rejections with a bounded retry loop.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::error::TransportError;
use super::quota::Quota;
use super::retry::ThrottlePolicy;
use crate::config::StoreConfig;

/// Response header carrying the `used/capacity` bucket state.
pub const CALL_LIMIT_HEADER: &str = "X-Shopify-Shop-Api-Call-Limit";

/// Request header carrying the Admin API access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Fixed pause applied after any response that shows the bucket near its
/// limit. A heuristic interval, not a proportional backoff.
pub const THROTTLE_PAUSE: Duration = Duration::from_secs(1);

/// Maximum response-body length carried in error messages.
const ERROR_BODY_SNIPPET_LEN: usize = 200;

/// Rate-limited HTTP client for one store's Admin API.
///
/// The client is designed to be created once per run and drives all traffic
/// sequentially: one outstanding request, with throttle and backoff waits
/// expressed as suspensions of the single control flow.
///
/// # Example
///
/// ```no_run
/// use shopsync_core::config::StoreConfig;
/// use shopsync_core::transport::ApiClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::new(StoreConfig::new("mystore", "shpat_secret"));
/// let response = client.get(&client.config().rest_url("shop.json")).await?;
/// let shop: serde_json::Value = response.json()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    config: StoreConfig,
    policy: ThrottlePolicy,
    /// Last observed bucket state, refreshed from every non-429 response.
    /// Behind a mutex only because requests take `&self`; the sequential
    /// control flow never holds it across an await.
    quota: Mutex<Option<Quota>>,
}

/// A successful (2xx) response with its headers and body text.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    headers: HeaderMap,
    body: String,
}

impl ApiResponse {
    fn new(status: u16, headers: HeaderMap, body: String) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns a response header as UTF-8, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the `Link` pagination header, if present.
    #[must_use]
    pub fn link_header(&self) -> Option<&str> {
        self.header("link")
    }

    /// Returns the raw body text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Protocol`] when the body is not valid JSON
    /// for the expected shape.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_str(&self.body)
            .map_err(|e| TransportError::protocol(format!("unparseable JSON response: {e}")))
    }
}

impl ApiClient {
    /// Creates a client for the given store configuration with the default
    /// throttle policy.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(config: StoreConfig) -> Self {
        Self::with_policy(config, ThrottlePolicy::default())
    }

    /// Creates a client with an explicit throttle policy.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_policy(config: StoreConfig, policy: ThrottlePolicy) -> Self {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            http,
            config,
            policy,
            quota: Mutex::new(None),
        }
    }

    /// Returns the store configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the last observed bucket state, if any response carried one.
    pub async fn quota(&self) -> Option<Quota> {
        *self.quota.lock().await
    }

    /// Executes one request, transparently handling throttling.
    ///
    /// - 429 responses are retried after the server-advised wait (or the
    ///   fallback), up to the policy's try budget; the budget spent, a
    ///   [`TransportError::QuotaExhausted`] surfaces instead of the 429.
    /// - Every other response refreshes the quota snapshot; at 80% bucket
    ///   usage a fixed pause is applied before control returns.
    /// - Any non-2xx status other than 429 is surfaced immediately.
    #[instrument(level = "debug", skip(self, body), fields(method = %method))]
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, TransportError> {
        let mut tries = 0;
        loop {
            tries += 1;
            let mut request = self
                .http
                .request(method.clone(), url)
                .header(ACCESS_TOKEN_HEADER, self.config.token());
            if let Some(body) = body {
                request = request.json(body);
            }

            match self.dispatch(request.send().await, url, tries).await? {
                Attempt::Done(response) => return Ok(response),
                Attempt::RateLimited => {}
            }
        }
    }

    /// Executes a multipart form POST to an arbitrary URL.
    ///
    /// Used for the staged-upload transfer phase, whose target URL is not
    /// part of the Admin API: no access token is attached, and the response
    /// carries no call-limit header to observe. The form cannot be reused
    /// across tries, so a builder closure constructs it per attempt.
    #[instrument(level = "debug", skip(self, make_form))]
    pub async fn execute_form<F>(&self, url: &str, make_form: F) -> Result<ApiResponse, TransportError>
    where
        F: Fn() -> reqwest::multipart::Form,
    {
        let mut tries = 0;
        loop {
            tries += 1;
            let request = self.http.post(url).multipart(make_form());

            match self.dispatch(request.send().await, url, tries).await? {
                Attempt::Done(response) => return Ok(response),
                Attempt::RateLimited => {}
            }
        }
    }

    /// Convenience wrapper for GET requests.
    pub async fn get(&self, url: &str) -> Result<ApiResponse, TransportError> {
        self.execute(Method::GET, url, None).await
    }

    /// Convenience wrapper for PUT requests with a JSON body.
    pub async fn put(&self, url: &str, body: &Value) -> Result<ApiResponse, TransportError> {
        self.execute(Method::PUT, url, Some(body)).await
    }

    /// Convenience wrapper for POST requests with a JSON body.
    pub async fn post(&self, url: &str, body: &Value) -> Result<ApiResponse, TransportError> {
        self.execute(Method::POST, url, Some(body)).await
    }

    /// Convenience wrapper for DELETE requests.
    pub async fn delete(&self, url: &str) -> Result<ApiResponse, TransportError> {
        self.execute(Method::DELETE, url, None).await
    }

    /// Posts a query to the Admin GraphQL endpoint and returns its `data`.
    ///
    /// # Errors
    ///
    /// Surfaces a top-level `errors` array as [`TransportError::Graphql`],
    /// and a response without `data` as [`TransportError::Protocol`].
    #[instrument(level = "debug", skip(self, query, variables))]
    pub async fn graphql(&self, query: &str, variables: Value) -> Result<Value, TransportError> {
        let url = self.config.graphql_url();
        let body = serde_json::json!({ "query": query, "variables": variables });
        let response = self.execute(Method::POST, &url, Some(&body)).await?;
        let payload: Value = response.json()?;

        if let Some(errors) = payload.get("errors") {
            let has_errors = match errors {
                Value::Null => false,
                Value::Array(list) => !list.is_empty(),
                _ => true,
            };
            if has_errors {
                return Err(TransportError::graphql(errors));
            }
        }

        payload
            .get("data")
            .cloned()
            .ok_or_else(|| TransportError::protocol("missing `data` in GraphQL response"))
    }

    /// Common per-attempt handling shared by JSON and multipart requests.
    async fn dispatch(
        &self,
        sent: Result<reqwest::Response, reqwest::Error>,
        url: &str,
        tries: u32,
    ) -> Result<Attempt, TransportError> {
        let response = sent.map_err(|e| {
            if e.is_timeout() {
                TransportError::timeout(url)
            } else {
                TransportError::network(url, e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            if tries >= self.policy.max_tries() {
                return Err(TransportError::quota_exhausted(url, tries));
            }
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok());
            let wait = self.policy.backoff(retry_after);
            warn!(
                url,
                tries,
                wait_secs = wait.as_secs_f64(),
                "rate limited, backing off before retry"
            );
            tokio::time::sleep(wait).await;
            return Ok(Attempt::RateLimited);
        }

        self.observe_quota(response.headers()).await;

        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::network(url, e))?;

        if !status.is_success() {
            return Err(TransportError::http_status(
                url,
                status.as_u16(),
                snippet(&body),
            ));
        }

        Ok(Attempt::Done(ApiResponse::new(status.as_u16(), headers, body)))
    }

    /// Refreshes the quota snapshot from a response and applies the
    /// proactive pause when the bucket is near its limit.
    async fn observe_quota(&self, headers: &HeaderMap) {
        let Some(quota) = headers
            .get(CALL_LIMIT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Quota::parse)
        else {
            return;
        };

        {
            let mut slot = self.quota.lock().await;
            *slot = Some(quota);
        }

        if quota.is_near_limit() {
            debug!(
                quota = %quota,
                pause_secs = THROTTLE_PAUSE.as_secs(),
                "call-limit bucket near capacity, pausing"
            );
            tokio::time::sleep(THROTTLE_PAUSE).await;
        }
    }
}

/// Outcome of a single try inside the retry loop.
enum Attempt {
    /// A non-429 response was obtained (already checked for success).
    Done(ApiResponse),
    /// A 429 was absorbed; the backoff sleep has already happened.
    RateLimited,
}

/// Truncates a response body for inclusion in error messages.
fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= ERROR_BODY_SNIPPET_LEN {
        return trimmed.to_string();
    }
    let mut cut = ERROR_BODY_SNIPPET_LEN;
    while !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &trimmed[..cut])
}
