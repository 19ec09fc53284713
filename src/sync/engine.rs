//! Read-modify-write engine over product descriptions.

use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::error::SyncError;
use crate::pagination::RestPager;
use crate::transport::ApiClient;

/// One product as returned by the listing, reduced to the fields the engine
/// touches.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    /// Stable server-side identifier.
    pub id: u64,
    /// Display title, used for reporting only.
    #[serde(default)]
    pub title: String,
    /// The description HTML the transform operates on.
    #[serde(default)]
    pub body_html: Option<String>,
}

/// Counts from one sync run.
///
/// Always reported in full, whether or not individual failures aborted the
/// run early.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Items whose transformed content differed and was written back.
    pub updated: usize,
    /// Items whose content was already in the desired form; no write issued.
    pub skipped: usize,
    /// Items whose write failed.
    pub failed: usize,
}

impl SyncReport {
    /// Total items processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.updated + self.skipped + self.failed
    }
}

/// Per-item outcome passed to the progress callback.
#[derive(Debug)]
pub enum SyncOutcome<'a> {
    /// The transform changed the content and the write succeeded.
    Updated,
    /// The transform left the content unchanged; no write was issued.
    Skipped,
    /// The write failed.
    Failed(&'a SyncError),
}

/// Drives the description cleanup against one store.
///
/// Streams products page by page, applies the transform to each
/// description, and PUTs back only the changed ones, in server order, one
/// write at a time.
///
/// # Example
///
/// ```no_run
/// use shopsync_core::config::StoreConfig;
/// use shopsync_core::rewrite::clean_description;
/// use shopsync_core::sync::SyncEngine;
/// use shopsync_core::transport::ApiClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::new(StoreConfig::new("mystore", "shpat_secret"));
/// let engine = SyncEngine::new(&client);
/// let report = engine
///     .clean_descriptions(clean_description, |_, _| {})
///     .await?;
/// println!("{} updated, {} unchanged", report.updated, report.skipped);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SyncEngine<'a> {
    client: &'a ApiClient,
    continue_on_error: bool,
}

impl<'a> SyncEngine<'a> {
    /// Creates an engine that halts on the first write failure.
    #[must_use]
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            continue_on_error: false,
        }
    }

    /// Overrides the continue-on-error policy.
    #[must_use]
    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Applies `transform` to every product description, writing back only
    /// the ones that changed (exact string comparison).
    ///
    /// `on_item` is invoked once per product with its outcome, in the order
    /// the store returned the items. Writes are independent per item; there
    /// is no batching and no cross-item transaction.
    ///
    /// # Errors
    ///
    /// An enumeration failure is always terminal. A write failure is
    /// terminal unless continue-on-error is set, in which case it is counted
    /// and reported via the callback instead.
    #[instrument(level = "debug", skip(self, transform, on_item))]
    pub async fn clean_descriptions<F, P>(
        &self,
        transform: F,
        mut on_item: P,
    ) -> Result<SyncReport, SyncError>
    where
        F: Fn(&str) -> String,
        P: FnMut(&Product, SyncOutcome<'_>),
    {
        let mut pager: RestPager<'_, Product> =
            RestPager::new(self.client, "products.json", "products");
        let mut report = SyncReport::default();

        while let Some(page) = pager.next_page().await? {
            for product in &page {
                let original = product.body_html.as_deref().unwrap_or_default();
                let cleaned = transform(original);

                if cleaned == original {
                    report.skipped += 1;
                    on_item(product, SyncOutcome::Skipped);
                    continue;
                }

                match self.update_description(product.id, &cleaned).await {
                    Ok(()) => {
                        report.updated += 1;
                        info!(id = product.id, title = %product.title, "updated description");
                        on_item(product, SyncOutcome::Updated);
                    }
                    Err(e) => {
                        report.failed += 1;
                        warn!(id = product.id, title = %product.title, error = %e, "write failed");
                        on_item(product, SyncOutcome::Failed(&e));
                        if !self.continue_on_error {
                            return Err(e);
                        }
                    }
                }
            }
        }

        info!(
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            total = report.total(),
            "description sync complete"
        );
        Ok(report)
    }

    /// Writes one product's description back, carrying only the changed
    /// field.
    pub async fn update_description(&self, id: u64, body_html: &str) -> Result<(), SyncError> {
        let url = self.client.config().rest_url(&format!("products/{id}.json"));
        let payload = json!({ "product": { "id": id, "body_html": body_html } });
        self.client
            .put(&url, &payload)
            .await
            .map_err(|source| SyncError::Write { id, source })?;
        Ok(())
    }
}
