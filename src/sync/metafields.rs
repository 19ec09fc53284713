//! Namespaced metafield purge across products and custom collections.

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::error::SyncError;
use crate::pagination::RestPager;
use crate::transport::{ApiClient, TransportError};

/// Namespace prefix the purge targets by default (leftover importer data).
pub const DEFAULT_NAMESPACE_PREFIX: &str = "woo";

/// Resource families whose metafields can be purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// `products.json`
    Products,
    /// `custom_collections.json`
    CustomCollections,
}

impl ResourceKind {
    /// REST resource path for the listing.
    #[must_use]
    pub fn resource(self) -> &'static str {
        match self {
            Self::Products => "products.json",
            Self::CustomCollections => "custom_collections.json",
        }
    }

    /// Root key of the listing response body, also the path segment for
    /// per-resource subrequests.
    #[must_use]
    pub fn root_key(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::CustomCollections => "custom_collections",
        }
    }
}

/// One metafield attached to a resource.
#[derive(Debug, Clone, Deserialize)]
pub struct Metafield {
    /// Stable server-side identifier, addressable for deletion.
    pub id: u64,
    /// Namespace the purge matches against.
    pub namespace: String,
    /// Key within the namespace, used for reporting.
    pub key: String,
}

/// Listing shape shared by both resource kinds; only the id is needed.
#[derive(Debug, Deserialize)]
struct ResourceRef {
    id: u64,
}

/// Counts from one purge run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MetafieldReport {
    /// Resources enumerated.
    pub scanned: usize,
    /// Metafields deleted.
    pub deleted: usize,
    /// Metafield listings or deletes that failed.
    pub failed: usize,
}

/// Deletes every metafield whose namespace starts with a prefix.
///
/// Unlike the description sync, per-resource failures do not halt the run
/// by default; they are counted and logged so the run can be re-issued for
/// the stragglers.
#[derive(Debug)]
pub struct MetafieldPurge<'a> {
    client: &'a ApiClient,
    prefix: String,
    continue_on_error: bool,
}

impl<'a> MetafieldPurge<'a> {
    /// Creates a purge for the default namespace prefix, continuing past
    /// per-resource failures.
    #[must_use]
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            prefix: DEFAULT_NAMESPACE_PREFIX.to_string(),
            continue_on_error: true,
        }
    }

    /// Overrides the namespace prefix to match.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Overrides the continue-on-error policy.
    #[must_use]
    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Purges matching metafields from every resource of `kind`.
    ///
    /// `on_resource` is invoked once per resource after it has been
    /// processed, with its id.
    ///
    /// # Errors
    ///
    /// An enumeration failure over the resource listing is always terminal.
    /// Metafield listing/delete failures are terminal only when
    /// continue-on-error is off.
    #[instrument(level = "debug", skip(self, on_resource), fields(prefix = %self.prefix))]
    pub async fn run<P>(
        &self,
        kind: ResourceKind,
        mut on_resource: P,
    ) -> Result<MetafieldReport, SyncError>
    where
        P: FnMut(u64),
    {
        let mut pager: RestPager<'_, ResourceRef> =
            RestPager::new(self.client, kind.resource(), kind.root_key());
        let mut report = MetafieldReport::default();

        while let Some(page) = pager.next_page().await? {
            for resource in &page {
                report.scanned += 1;

                let metafields = match self.list_metafields(kind, resource.id).await {
                    Ok(metafields) => metafields,
                    Err(e) => {
                        report.failed += 1;
                        warn!(resource_id = resource.id, error = %e, "metafield listing failed");
                        if !self.continue_on_error {
                            return Err(e);
                        }
                        on_resource(resource.id);
                        continue;
                    }
                };

                for metafield in metafields
                    .iter()
                    .filter(|m| m.namespace.starts_with(&self.prefix))
                {
                    match self.delete_metafield(metafield.id).await {
                        Ok(()) => {
                            report.deleted += 1;
                            info!(
                                resource_id = resource.id,
                                metafield = %format!("{}.{}", metafield.namespace, metafield.key),
                                "deleted metafield"
                            );
                        }
                        Err(e) => {
                            report.failed += 1;
                            warn!(metafield_id = metafield.id, error = %e, "delete failed");
                            if !self.continue_on_error {
                                return Err(e);
                            }
                        }
                    }
                }

                on_resource(resource.id);
            }
        }

        info!(
            scanned = report.scanned,
            deleted = report.deleted,
            failed = report.failed,
            "metafield purge complete"
        );
        Ok(report)
    }

    /// Lists one resource's metafields.
    async fn list_metafields(
        &self,
        kind: ResourceKind,
        resource_id: u64,
    ) -> Result<Vec<Metafield>, SyncError> {
        let url = self
            .client
            .config()
            .rest_url(&format!("{}/{resource_id}/metafields.json", kind.root_key()));
        let response = self.client.get(&url).await?;
        let payload: Value = response.json()?;
        let metafields = payload
            .get("metafields")
            .cloned()
            .ok_or_else(|| TransportError::protocol("missing `metafields` in response"))?;
        let metafields: Vec<Metafield> = serde_json::from_value(metafields)
            .map_err(|e| TransportError::protocol(format!("unexpected metafield shape: {e}")))?;
        Ok(metafields)
    }

    /// Deletes one metafield by id.
    async fn delete_metafield(&self, id: u64) -> Result<(), SyncError> {
        let url = self.client.config().rest_url(&format!("metafields/{id}.json"));
        self.client
            .delete(&url)
            .await
            .map_err(|source| SyncError::Delete { id, source })?;
        Ok(())
    }
}
