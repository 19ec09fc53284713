//! Header-cursor pagination over Admin REST collections.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::link::next_page_info;
use crate::transport::{ApiClient, TransportError};

/// Page size requested from REST collections (the API maximum).
pub const PAGE_LIMIT: u32 = 250;

/// Pull-based pager over a REST collection such as `products.json`.
///
/// Each call to [`next_page`](Self::next_page) fetches one page and advances
/// the continuation token parsed from the `Link` response header. The
/// collection's items live under a root key in the response body
/// (`{"products": [...]}`), which is part of the pager's construction.
///
/// # Example
///
/// ```no_run
/// use shopsync_core::config::StoreConfig;
/// use shopsync_core::sync::Product;
/// use shopsync_core::transport::ApiClient;
/// use shopsync_core::pagination::RestPager;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::new(StoreConfig::new("mystore", "shpat_secret"));
/// let mut pager: RestPager<'_, Product> = RestPager::new(&client, "products.json", "products");
/// while let Some(page) = pager.next_page().await? {
///     for product in page {
///         println!("{}", product.title);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RestPager<'a, T> {
    client: &'a ApiClient,
    base_url: String,
    root_key: &'static str,
    page_info: Option<String>,
    done: bool,
    _items: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned> RestPager<'a, T> {
    /// Creates a pager over `resource` (e.g. `products.json`), whose items
    /// are found under `root_key` in each response body.
    #[must_use]
    pub fn new(client: &'a ApiClient, resource: &str, root_key: &'static str) -> Self {
        Self {
            client,
            base_url: client.config().rest_url(resource),
            root_key,
            page_info: None,
            done: false,
            _items: PhantomData,
        }
    }

    /// Fetches the next page, or `None` once enumeration has terminated.
    ///
    /// Termination: an empty page, or a response whose `Link` header carries
    /// no usable `rel="next"` token. A transport or protocol error is
    /// terminal; subsequent calls return `Ok(None)`.
    #[instrument(level = "debug", skip(self), fields(resource = self.root_key))]
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>, TransportError> {
        if self.done {
            return Ok(None);
        }

        let url = self.page_url()?;
        let response = match self.client.get(url.as_str()).await {
            Ok(response) => response,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };

        let payload: Value = match response.json() {
            Ok(payload) => payload,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };
        let Some(items) = payload.get(self.root_key).and_then(Value::as_array) else {
            self.done = true;
            return Err(TransportError::protocol(format!(
                "missing `{}` array in listing response",
                self.root_key
            )));
        };

        // Empty page terminates even if the header still advertises a next
        // relation.
        if items.is_empty() {
            debug!("empty page, ending enumeration");
            self.done = true;
            return Ok(None);
        }

        let items: Vec<T> = match serde_json::from_value(Value::Array(items.clone())) {
            Ok(items) => items,
            Err(e) => {
                self.done = true;
                return Err(TransportError::protocol(format!(
                    "unexpected `{}` item shape: {e}",
                    self.root_key
                )));
            }
        };

        self.page_info = response.link_header().and_then(next_page_info);
        if self.page_info.is_none() {
            self.done = true;
        }

        debug!(items = items.len(), has_next = !self.done, "fetched page");
        Ok(Some(items))
    }

    /// Drains the pager into a single vector, preserving server order.
    pub async fn collect_all(&mut self) -> Result<Vec<T>, TransportError> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page);
        }
        Ok(all)
    }

    fn page_url(&self) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TransportError::protocol(format!("invalid listing URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("limit", &PAGE_LIMIT.to_string());
        if let Some(page_info) = &self.page_info {
            url.query_pairs_mut().append_pair("page_info", page_info);
        }
        Ok(url)
    }
}
