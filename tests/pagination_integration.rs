//! Integration tests for page enumeration over both pagination encodings.

use std::time::Duration;

use serde_json::json;
use shopsync_core::config::StoreConfig;
use shopsync_core::pagination::{CursorPager, RestPager};
use shopsync_core::sync::Product;
use shopsync_core::transport::{ApiClient, TransportError};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    let config = StoreConfig::new("teststore", "shpat_test")
        .with_admin_base(server.uri())
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(5));
    ApiClient::new(config)
}

/// Mounts one REST products page keyed by its `page_info` token, with an
/// optional `rel="next"` Link header pointing at the next token.
async fn mount_products_page(
    server: &MockServer,
    page_info: Option<&str>,
    ids: &[u64],
    next: Option<&str>,
) {
    let products: Vec<_> = ids
        .iter()
        .map(|id| json!({ "id": id, "title": format!("Product {id}"), "body_html": "" }))
        .collect();

    let mut response = ResponseTemplate::new(200).set_body_json(json!({ "products": products }));
    if let Some(next) = next {
        response = response.insert_header(
            "Link",
            format!(
                "<{}/admin/api/2024-04/products.json?limit=250&page_info={next}>; rel=\"next\"",
                server.uri()
            )
            .as_str(),
        );
    }

    let mut mock = Mock::given(method("GET")).and(path("/admin/api/2024-04/products.json"));
    if let Some(token) = page_info {
        mock = mock.and(query_param("page_info", token));
    }
    mock.respond_with(response).mount(server).await;
}

#[tokio::test]
async fn test_rest_pager_concatenates_pages_in_order() {
    let server = MockServer::start().await;
    // Most specific mocks first: wiremock picks the first match in mount order.
    mount_products_page(&server, Some("p2"), &[3, 4], Some("p3")).await;
    mount_products_page(&server, Some("p3"), &[5, 6], None).await;
    mount_products_page(&server, None, &[1, 2], Some("p2")).await;

    let client = client_for(&server);
    let mut pager: RestPager<'_, Product> = RestPager::new(&client, "products.json", "products");
    let products = pager.collect_all().await.expect("enumeration should succeed");

    let ids: Vec<u64> = products.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3, "one request per page");
}

#[tokio::test]
async fn test_rest_pager_stops_without_next_relation() {
    let server = MockServer::start().await;
    mount_products_page(&server, None, &[1, 2], None).await;

    let client = client_for(&server);
    let mut pager: RestPager<'_, Product> = RestPager::new(&client, "products.json", "products");

    let first = pager.next_page().await.unwrap();
    assert_eq!(first.map(|page| page.len()), Some(2));
    assert!(pager.next_page().await.unwrap().is_none());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "no next relation means no second fetch");
}

#[tokio::test]
async fn test_rest_pager_empty_page_terminates_despite_next_signal() {
    let server = MockServer::start().await;
    mount_products_page(&server, Some("p2"), &[], Some("p3")).await;
    mount_products_page(&server, None, &[1, 2], Some("p2")).await;

    let client = client_for(&server);
    let mut pager: RestPager<'_, Product> = RestPager::new(&client, "products.json", "products");
    let products = pager.collect_all().await.expect("enumeration should succeed");

    assert_eq!(products.len(), 2, "empty page ends enumeration");
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2, "the advertised third page is never fetched");
}

#[tokio::test]
async fn test_rest_pager_missing_root_key_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/api/2024-04/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": [] })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut pager: RestPager<'_, Product> = RestPager::new(&client, "products.json", "products");
    let result = pager.next_page().await;

    assert!(
        matches!(result, Err(TransportError::Protocol { .. })),
        "expected protocol error, got: {result:?}"
    );
    // The error is terminal for the enumeration.
    assert!(pager.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn test_rest_pager_transport_error_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/api/2024-04/products.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut pager: RestPager<'_, Product> = RestPager::new(&client, "products.json", "products");

    assert!(pager.next_page().await.is_err());
    assert!(pager.next_page().await.unwrap().is_none());
}

const NODES_QUERY: &str = r#"
  query($cursor: String) {
    files(first: 250, after: $cursor) {
      pageInfo { hasNextPage endCursor }
      edges { node { alt } }
    }
  }
"#;

/// Mounts one GraphQL connection page, matched by the serialized cursor
/// variable in the request body.
async fn mount_cursor_page(
    server: &MockServer,
    cursor_needle: &str,
    alts: &[&str],
    has_next: bool,
    end_cursor: Option<&str>,
) {
    let edges: Vec<_> = alts.iter().map(|alt| json!({ "node": { "alt": alt } })).collect();
    Mock::given(method("POST"))
        .and(path("/admin/api/2024-04/graphql.json"))
        .and(body_string_contains(cursor_needle))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "files": {
                    "pageInfo": { "hasNextPage": has_next, "endCursor": end_cursor },
                    "edges": edges
                }
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cursor_pager_follows_end_cursor() {
    let server = MockServer::start().await;
    mount_cursor_page(&server, "\"cursor\":\"c2\"", &["c.png", "d.png"], false, None).await;
    mount_cursor_page(&server, "\"cursor\":null", &["a.png", "b.png"], true, Some("c2")).await;

    let client = client_for(&server);
    let mut pager = CursorPager::new(&client, NODES_QUERY, "files");
    let nodes = pager.collect_all().await.expect("enumeration should succeed");

    let alts: Vec<&str> = nodes.iter().filter_map(|n| n["alt"].as_str()).collect();
    assert_eq!(alts, vec!["a.png", "b.png", "c.png", "d.png"]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_cursor_pager_stops_when_has_next_false() {
    let server = MockServer::start().await;
    mount_cursor_page(&server, "\"cursor\":null", &["a.png"], false, Some("ignored")).await;

    let client = client_for(&server);
    let mut pager = CursorPager::new(&client, NODES_QUERY, "files");

    assert_eq!(pager.next_page().await.unwrap().map(|p| p.len()), Some(1));
    assert!(pager.next_page().await.unwrap().is_none());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "hasNextPage=false ends enumeration");
}

#[tokio::test]
async fn test_cursor_pager_empty_page_terminates() {
    let server = MockServer::start().await;
    mount_cursor_page(&server, "\"cursor\":null", &[], true, Some("c2")).await;

    let client = client_for(&server);
    let mut pager = CursorPager::new(&client, NODES_QUERY, "files");

    assert!(pager.next_page().await.unwrap().is_none());
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "empty page ends enumeration immediately");
}

#[tokio::test]
async fn test_cursor_pager_missing_page_info_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2024-04/graphql.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "files": { "edges": [{ "node": { "alt": "a.png" } }] } }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut pager = CursorPager::new(&client, NODES_QUERY, "files");
    let result = pager.next_page().await;

    assert!(
        matches!(result, Err(TransportError::Protocol { .. })),
        "expected protocol error, got: {result:?}"
    );
}
