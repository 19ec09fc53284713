//! Body-cursor pagination over Admin GraphQL connections.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::transport::{ApiClient, TransportError};

/// `pageInfo` object of a GraphQL connection.
#[derive(Debug, Clone, Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

/// Pull-based pager over a GraphQL connection query.
///
/// The query must declare a `$cursor: String` variable, pass it as the
/// connection's `after` argument, and select `pageInfo { hasNextPage
/// endCursor }` plus `edges { node { ... } }`. Each page yields the edge
/// nodes in server order.
///
/// # Example
///
/// ```no_run
/// use shopsync_core::config::StoreConfig;
/// use shopsync_core::transport::ApiClient;
/// use shopsync_core::pagination::CursorPager;
///
/// const QUERY: &str = r#"
///   query($cursor: String) {
///     files(first: 250, after: $cursor) {
///       pageInfo { hasNextPage endCursor }
///       edges { node { alt } }
///     }
///   }
/// "#;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::new(StoreConfig::new("mystore", "shpat_secret"));
/// let mut pager = CursorPager::new(&client, QUERY, "files");
/// while let Some(nodes) = pager.next_page().await? {
///     println!("{} nodes", nodes.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CursorPager<'a> {
    client: &'a ApiClient,
    query: &'static str,
    connection_key: &'static str,
    cursor: Option<String>,
    done: bool,
}

impl<'a> CursorPager<'a> {
    /// Creates a pager for `query`, whose connection lives under
    /// `connection_key` in the response data.
    #[must_use]
    pub fn new(client: &'a ApiClient, query: &'static str, connection_key: &'static str) -> Self {
        Self {
            client,
            query,
            connection_key,
            cursor: None,
            done: false,
        }
    }

    /// Fetches the next page of edge nodes, or `None` once enumeration has
    /// terminated.
    ///
    /// Termination: `hasNextPage` false, a missing/empty end cursor, or an
    /// empty page. A transport or protocol error is terminal; subsequent
    /// calls return `Ok(None)`.
    #[instrument(level = "debug", skip(self), fields(connection = self.connection_key))]
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>, TransportError> {
        if self.done {
            return Ok(None);
        }

        let variables = json!({ "cursor": self.cursor });
        let data = match self.client.graphql(self.query, variables).await {
            Ok(data) => data,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };

        let connection = match self.connection(&data) {
            Ok(connection) => connection,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };

        // Defensive guard: an empty page ends enumeration regardless of
        // what pageInfo claims.
        if connection.nodes.is_empty() {
            debug!("empty page, ending enumeration");
            self.done = true;
            return Ok(None);
        }

        if connection.page_info.has_next_page {
            match connection.page_info.end_cursor {
                Some(cursor) if !cursor.is_empty() => self.cursor = Some(cursor),
                _ => self.done = true,
            }
        } else {
            self.done = true;
        }

        debug!(
            nodes = connection.nodes.len(),
            has_next = !self.done,
            "fetched page"
        );
        Ok(Some(connection.nodes))
    }

    /// Drains the pager into a single vector, preserving server order.
    pub async fn collect_all(&mut self) -> Result<Vec<Value>, TransportError> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page);
        }
        Ok(all)
    }

    fn connection(&self, data: &Value) -> Result<Connection, TransportError> {
        let connection = data.get(self.connection_key).ok_or_else(|| {
            TransportError::protocol(format!(
                "missing `{}` connection in GraphQL data",
                self.connection_key
            ))
        })?;

        let edges = connection
            .get("edges")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                TransportError::protocol(format!(
                    "missing `{}.edges` in GraphQL data",
                    self.connection_key
                ))
            })?;
        let nodes = edges
            .iter()
            .filter_map(|edge| edge.get("node").cloned())
            .collect();

        let page_info = connection.get("pageInfo").cloned().ok_or_else(|| {
            TransportError::protocol(format!(
                "missing `{}.pageInfo` in GraphQL data",
                self.connection_key
            ))
        })?;
        let page_info: PageInfo = serde_json::from_value(page_info).map_err(|e| {
            TransportError::protocol(format!("unexpected `pageInfo` shape: {e}"))
        })?;

        Ok(Connection { nodes, page_info })
    }
}

struct Connection {
    nodes: Vec<Value>,
    page_info: PageInfo,
}
