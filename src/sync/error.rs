//! Error types for the sync drivers.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors from the read-modify-write and metafield-purge drivers.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing or enumeration failed; terminal for the run.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Writing one item's changed content back failed.
    #[error("failed to update product {id}: {source}")]
    Write {
        /// The product whose write failed.
        id: u64,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// Deleting one metafield failed.
    #[error("failed to delete metafield {id}: {source}")]
    Delete {
        /// The metafield whose delete failed.
        id: u64,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_names_the_product() {
        let error = SyncError::Write {
            id: 42,
            source: TransportError::timeout("https://x.myshopify.com/admin"),
        };
        let msg = error.to_string();
        assert!(msg.contains("42"), "Expected product id in: {msg}");
        assert!(msg.contains("timeout"), "Expected cause in: {msg}");
    }

    #[test]
    fn test_transport_error_passes_through() {
        let error: SyncError = TransportError::protocol("missing `products`").into();
        assert!(error.to_string().contains("products"));
    }
}
