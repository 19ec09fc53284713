//! Store configuration for the Shopify Admin API.
//!
//! All session state the Python-era tooling kept on an implicit HTTP session
//! (store domain, access token, API version) lives in an explicit
//! [`StoreConfig`] value that is passed into the transport at construction.

use std::time::Duration;

/// Default Admin API version used when none is supplied.
pub const DEFAULT_API_VERSION: &str = "2024-04";

/// Connect timeout for the HTTP client (seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Per-request timeout (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration for one Shopify store.
///
/// # Example
///
/// ```
/// use shopsync_core::config::StoreConfig;
///
/// let config = StoreConfig::new("mystore.myshopify.com", "shpat_secret");
/// assert_eq!(
///     config.rest_url("products.json"),
///     "https://mystore.myshopify.com/admin/api/2024-04/products.json"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store handle without the `.myshopify.com` suffix.
    store: String,

    /// Admin API access token (`shpat_...`).
    token: String,

    /// Admin API version segment, e.g. `2024-04`.
    api_version: String,

    /// Connect timeout for the underlying HTTP client.
    connect_timeout: Duration,

    /// Per-request timeout.
    request_timeout: Duration,

    /// Admin base URL override (no trailing slash). Points the client at a
    /// local mock server in tests.
    admin_base: Option<String>,
}

impl StoreConfig {
    /// Creates a configuration for the given store and token.
    ///
    /// The store may be given as `mystore` or `mystore.myshopify.com`;
    /// the suffix is stripped either way.
    #[must_use]
    pub fn new(store: impl AsRef<str>, token: impl Into<String>) -> Self {
        Self {
            store: normalize_store_handle(store.as_ref()),
            token: token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            admin_base: None,
        }
    }

    /// Overrides the Admin API version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Overrides both timeouts. Used by tests to fail fast.
    #[must_use]
    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    /// Overrides the Admin base URL (scheme + host), e.g. to point the
    /// client at a local mock server. The API-version path segment is still
    /// appended.
    #[must_use]
    pub fn with_admin_base(mut self, base: impl AsRef<str>) -> Self {
        self.admin_base = Some(base.as_ref().trim_end_matches('/').to_string());
        self
    }

    /// Returns the store handle (without domain suffix).
    #[must_use]
    pub fn store(&self) -> &str {
        &self.store
    }

    /// Returns the access token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the configured API version.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Returns the connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Builds a fully qualified Admin REST URL for a resource path such as
    /// `products.json` or `products/42/metafields.json`.
    #[must_use]
    pub fn rest_url(&self, resource: &str) -> String {
        match &self.admin_base {
            Some(base) => format!("{base}/admin/api/{}/{resource}", self.api_version),
            None => format!(
                "https://{}.myshopify.com/admin/api/{}/{resource}",
                self.store, self.api_version
            ),
        }
    }

    /// Builds the Admin GraphQL endpoint URL.
    #[must_use]
    pub fn graphql_url(&self) -> String {
        self.rest_url("graphql.json")
    }
}

/// Strips an optional `.myshopify.com` suffix and surrounding whitespace.
fn normalize_store_handle(store: &str) -> String {
    store.trim().trim_end_matches(".myshopify.com").to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_store_handle_strips_domain_suffix() {
        let config = StoreConfig::new("mystore.myshopify.com", "t");
        assert_eq!(config.store(), "mystore");
    }

    #[test]
    fn test_store_handle_bare_name_unchanged() {
        let config = StoreConfig::new("mystore", "t");
        assert_eq!(config.store(), "mystore");
    }

    #[test]
    fn test_rest_url_includes_version_and_resource() {
        let config = StoreConfig::new("mystore", "t").with_api_version("2025-04");
        assert_eq!(
            config.rest_url("products/7/metafields.json"),
            "https://mystore.myshopify.com/admin/api/2025-04/products/7/metafields.json"
        );
    }

    #[test]
    fn test_graphql_url() {
        let config = StoreConfig::new("mystore", "t");
        assert_eq!(
            config.graphql_url(),
            "https://mystore.myshopify.com/admin/api/2024-04/graphql.json"
        );
    }

    #[test]
    fn test_default_timeouts() {
        let config = StoreConfig::new("mystore", "t");
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_admin_base_override_rewrites_host() {
        let config = StoreConfig::new("mystore", "t").with_admin_base("http://127.0.0.1:9999/");
        assert_eq!(
            config.rest_url("products.json"),
            "http://127.0.0.1:9999/admin/api/2024-04/products.json"
        );
        assert_eq!(
            config.graphql_url(),
            "http://127.0.0.1:9999/admin/api/2024-04/graphql.json"
        );
    }
}
