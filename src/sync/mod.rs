//! Bulk read-modify-write drivers.
//!
//! [`SyncEngine`] streams every product, applies a caller-supplied transform
//! to its description, and writes back only the items whose content actually
//! changed. [`MetafieldPurge`] is the companion driver that deletes
//! namespaced metafields matching a prefix across products or custom
//! collections.
//!
//! Both drivers process items strictly in the order the store returns them,
//! one write at a time, and report run counts whether or not individual
//! failures were fatal. Whether a per-item failure aborts the run is an
//! explicit continue-on-error flag on each driver.

mod engine;
mod error;
mod metafields;

pub use engine::{Product, SyncEngine, SyncOutcome, SyncReport};
pub use error::SyncError;
pub use metafields::{
    DEFAULT_NAMESPACE_PREFIX, Metafield, MetafieldPurge, MetafieldReport, ResourceKind,
};
