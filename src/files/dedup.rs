//! Existence index over the store's Files library.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::pagination::CursorPager;
use crate::transport::{ApiClient, TransportError};

/// Connection query enumerating every file with its aliased identity fields.
///
/// A file is recognizable by either the basename of its stored URL or its
/// `alt` text (set to the original local filename at upload time).
pub const FILES_QUERY: &str = r#"
  query($cursor: String) {
    files(first: 250, after: $cursor) {
      pageInfo { hasNextPage endCursor }
      edges {
        node {
          __typename
          ... on GenericFile { url }
          ... on MediaImage  { image { url } }
          alt
        }
      }
    }
  }
"#;

/// Normalized set of filenames that already exist in the Files library.
///
/// Candidate keys and lookups both pass through [`normalize_name`]; skipping
/// either side would reintroduce duplicates.
///
/// # Example
///
/// ```
/// use shopsync_core::files::FileIndex;
///
/// let index = FileIndex::from_names(["photo.jpg", "Logo.PNG"]);
/// assert!(index.contains("photo.JPEG"));
/// assert!(index.contains("logo.png"));
/// assert!(!index.contains("banner.gif"));
/// ```
#[derive(Debug, Default)]
pub struct FileIndex {
    names: HashSet<String>,
}

impl FileIndex {
    /// Builds the index by enumerating the full `files` connection.
    #[instrument(level = "debug", skip(client))]
    pub async fn build(client: &ApiClient) -> Result<Self, TransportError> {
        let mut pager = CursorPager::new(client, FILES_QUERY, "files");
        let mut names = HashSet::new();
        while let Some(nodes) = pager.next_page().await? {
            for node in &nodes {
                for key in candidate_keys(node) {
                    names.insert(normalize_name(&key));
                }
            }
        }
        debug!(keys = names.len(), "built file existence index");
        Ok(Self { names })
    }

    /// Builds an index from raw names, normalizing each. Used by tests and
    /// callers that already hold a listing.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|name| normalize_name(name.as_ref()))
                .collect(),
        }
    }

    /// Whether a candidate filename already has a remote counterpart.
    #[must_use]
    pub fn contains(&self, candidate: &str) -> bool {
        self.names.contains(&normalize_name(candidate))
    }

    /// Number of distinct normalized keys in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the index holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Collects the aliased identity fields of one `files` node.
///
/// Yields the basename of the stored URL (`GenericFile.url` or
/// `MediaImage.image.url`) and the trimmed `alt` text when present.
fn candidate_keys(node: &Value) -> Vec<String> {
    let mut keys = Vec::new();

    let stored_url = node
        .get("url")
        .or_else(|| node.get("image").and_then(|image| image.get("url")))
        .and_then(Value::as_str);
    if let Some(name) = stored_url.and_then(url_basename) {
        keys.push(name);
    }

    if let Some(alt) = node.get("alt").and_then(Value::as_str) {
        let alt = alt.trim();
        if !alt.is_empty() {
            keys.push(alt.to_string());
        }
    }

    keys
}

/// Extracts the final path segment of a stored-file URL.
fn url_basename(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let name = parsed.path_segments()?.next_back()?;
    (!name.is_empty()).then(|| name.to_string())
}

/// Normalizes a filename into its existence key: lowercased, with a `.jpeg`
/// suffix canonicalized to `.jpg`.
///
/// Applied identically when building the index and when testing a candidate.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix(".jpeg") {
        Some(stem) => format!("{stem}.jpg"),
        None => lower,
    }
}
