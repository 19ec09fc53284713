//! Error types for file uploads.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::transport::TransportError;

/// One entry of a mutation's `userErrors` list.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldError {
    /// Path of the offending input field, when the server names one.
    pub field: Option<Vec<String>>,
    /// Server-side validation message.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(path) if !path.is_empty() => {
                write!(f, "{}: {}", path.join("."), self.message)
            }
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Joins field errors for display in error messages.
fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from the staged-upload pipeline and its surrounding driver.
///
/// The negotiate/transfer/finalize variants are terminal for the file they
/// name; whether they abort the whole run is the driver's continue-on-error
/// policy.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The upload source folder does not exist or is not a directory.
    ///
    /// Raised before any remote call is made.
    #[error("upload source {path} is not a directory")]
    SourceMissing {
        /// The path that was supplied.
        path: PathBuf,
    },

    /// Reading a local file failed.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The negotiation mutation rejected the file with field errors.
    #[error("staging rejected for {filename}: {}", join_errors(.errors))]
    Staging {
        /// The local filename being negotiated.
        filename: String,
        /// Server-reported field errors.
        errors: Vec<FieldError>,
    },

    /// The byte transfer to the staged target failed.
    ///
    /// The file remains negotiated-but-untransferred; the target is not
    /// reusable after expiry and is not retried.
    #[error("transfer failed for {filename}: HTTP {status}")]
    Transfer {
        /// The local filename being transferred.
        filename: String,
        /// The non-success status returned by the target.
        status: u16,
    },

    /// The finalize mutation rejected the file with field errors.
    ///
    /// The transferred blob is orphaned: no file record exists and the file
    /// stays invisible to dedup on future runs.
    #[error("finalize rejected for {filename}: {}", join_errors(.errors))]
    Finalize {
        /// The local filename being finalized.
        filename: String,
        /// Server-reported field errors.
        errors: Vec<FieldError>,
    },

    /// Transport-level failure in any phase.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl UploadError {
    /// Creates a source-missing error.
    pub fn source_missing(path: impl Into<PathBuf>) -> Self {
        Self::SourceMissing { path: path.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
