//! Local folder enumeration for uploads.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::UploadError;

/// One local file queued for upload.
#[derive(Debug, Clone)]
pub struct LocalFile {
    /// Full path on disk.
    pub path: PathBuf,
    /// Bare filename, used for dedup and as the remote `alt` text.
    pub name: String,
    /// Size in bytes, required by the negotiation phase.
    pub size: u64,
    /// MIME type guessed from the extension
    /// (`application/octet-stream` fallback).
    pub mime: String,
}

/// Scans a folder (non-recursively) into upload candidates, sorted by name.
///
/// # Errors
///
/// Returns [`UploadError::SourceMissing`] when the path is not a directory —
/// checked before any remote call is made — and [`UploadError::Io`] when the
/// directory cannot be read. Entries with non-UTF-8 names are skipped with a
/// warning; subdirectories are ignored.
pub fn scan_folder(folder: &Path) -> Result<Vec<LocalFile>, UploadError> {
    if !folder.is_dir() {
        return Err(UploadError::source_missing(folder));
    }

    let mut files = Vec::new();
    let entries = std::fs::read_dir(folder).map_err(|e| UploadError::io(folder, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| UploadError::io(folder, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!(path = %path.display(), "skipping file with non-UTF-8 name");
            continue;
        };

        let metadata = entry.metadata().map_err(|e| UploadError::io(&path, e))?;
        let mime = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        files.push(LocalFile {
            name: name.to_string(),
            size: metadata.len(),
            mime,
            path,
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(folder = %folder.display(), files = files.len(), "scanned upload folder");
    Ok(files)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_missing_folder_is_user_input_error() {
        let result = scan_folder(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(UploadError::SourceMissing { .. })));
    }

    #[test]
    fn test_scan_collects_files_with_mime_and_size() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"png-bytes").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"jpg").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let files = scan_folder(dir.path()).unwrap();
        assert_eq!(files.len(), 2, "subdirectories are ignored");
        // Sorted by name
        assert_eq!(files[0].name, "a.jpg");
        assert_eq!(files[1].name, "b.png");
        assert_eq!(files[0].size, 3);
        assert_eq!(files[0].mime, "image/jpeg");
        assert_eq!(files[1].mime, "image/png");
    }

    #[test]
    fn test_scan_unknown_extension_falls_back_to_octet_stream() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.weird"), b"x").unwrap();

        let files = scan_folder(dir.path()).unwrap();
        assert_eq!(files[0].mime, "application/octet-stream");
    }
}
