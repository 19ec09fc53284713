//! File library sync: dedup index, staged uploads, local folder scan.
//!
//! Uploading to the Files library is a three-phase protocol per file:
//! negotiate a staged target, transfer the bytes to it, then finalize a file
//! record referencing the transferred object. A file only becomes visible to
//! future [`FileIndex`] builds once finalize succeeds; a transfer whose
//! finalize fails orphans a staged blob with no record, which is an accepted
//! risk and is not cleaned up automatically.
//!
//! Duplicate avoidance rests on a multi-key existence index: both the stored
//! filename (parsed out of the file's URL) and the `alt` text (set to the
//! original local filename at finalize time) identify a remote file, and
//! both sides of every comparison go through the same normalization.

mod dedup;
mod error;
mod local;
pub mod staged;
mod uploader;

pub use dedup::{FILES_QUERY, FileIndex, normalize_name};
pub use error::{FieldError, UploadError};
pub use local::{LocalFile, scan_folder};
pub use staged::{StagedParameter, StagedTarget};
pub use uploader::{FileOutcome, UploadReport, Uploader};
