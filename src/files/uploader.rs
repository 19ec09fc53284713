//! Upload driver: scan, filter against the dedup index, run the pipeline.

use std::path::Path;

use tracing::{info, instrument, warn};

use super::dedup::FileIndex;
use super::error::UploadError;
use super::local::{LocalFile, scan_folder};
use super::staged;
use crate::transport::ApiClient;

/// Counts from one upload run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadReport {
    /// Files that completed all three phases.
    pub uploaded: usize,
    /// Files skipped because the index already knew them.
    pub skipped: usize,
    /// Files whose pipeline failed.
    pub failed: usize,
}

impl UploadReport {
    /// Total files considered.
    #[must_use]
    pub fn total(&self) -> usize {
        self.uploaded + self.skipped + self.failed
    }
}

/// Per-file outcome passed to the progress callback.
#[derive(Debug)]
pub enum FileOutcome<'a> {
    /// All three phases completed; carries the created record id.
    Uploaded(&'a str),
    /// Already present remotely; zero remote calls were made for this file.
    Skipped,
    /// A phase failed terminally for this file.
    Failed(&'a UploadError),
}

/// Drives folder uploads against one store.
#[derive(Debug)]
pub struct Uploader<'a> {
    client: &'a ApiClient,
    continue_on_error: bool,
}

impl<'a> Uploader<'a> {
    /// Creates an uploader that keeps going past per-file failures.
    #[must_use]
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            continue_on_error: true,
        }
    }

    /// Overrides the continue-on-error policy.
    #[must_use]
    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Uploads every file in `folder` that the Files library does not
    /// already hold, under either its stored name or its `alt` text.
    ///
    /// The folder is validated before any remote call. `on_item` is invoked
    /// once per local file with its outcome, in filename order.
    ///
    /// # Errors
    ///
    /// [`UploadError::SourceMissing`] for a bad folder; a transport error
    /// while building the dedup index; or, when continue-on-error is off,
    /// the first per-file failure.
    #[instrument(level = "debug", skip(self, on_item), fields(folder = %folder.display()))]
    pub async fn upload_folder<F>(
        &self,
        folder: &Path,
        mut on_item: F,
    ) -> Result<UploadReport, UploadError>
    where
        F: FnMut(&LocalFile, FileOutcome<'_>),
    {
        let files = scan_folder(folder)?;
        if files.is_empty() {
            info!("no files to consider");
            return Ok(UploadReport::default());
        }

        let index = FileIndex::build(self.client).await?;
        info!(
            candidates = files.len(),
            existing = index.len(),
            "built existence index"
        );

        let mut report = UploadReport::default();
        for file in &files {
            if index.contains(&file.name) {
                report.skipped += 1;
                on_item(file, FileOutcome::Skipped);
                continue;
            }

            match staged::upload(self.client, file).await {
                Ok(id) => {
                    report.uploaded += 1;
                    info!(filename = %file.name, id = %id, "uploaded");
                    on_item(file, FileOutcome::Uploaded(&id));
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(filename = %file.name, error = %e, "upload failed");
                    on_item(file, FileOutcome::Failed(&e));
                    if !self.continue_on_error {
                        return Err(e);
                    }
                }
            }
        }

        info!(
            uploaded = report.uploaded,
            skipped = report.skipped,
            failed = report.failed,
            "upload run complete"
        );
        Ok(report)
    }
}
