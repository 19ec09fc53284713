//! `Link` response-header parsing for REST pagination.
//!
//! The Admin REST API advertises the next page as a link relation:
//!
//! ```text
//! Link: <https://x.myshopify.com/admin/api/2024-04/products.json?page_info=abc&limit=250>; rel="next"
//! ```
//!
//! The continuation token is the `page_info` query parameter of the
//! `rel="next"` URL. Absence of the relation, or an empty token, ends
//! enumeration.

use url::Url;

/// Query parameter carrying the REST continuation token.
const PAGE_INFO_PARAM: &str = "page_info";

/// One `<url>; rel="..."` entry from a `Link` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRelation {
    /// The target URL, without the angle brackets.
    pub url: String,
    /// The `rel` parameter value, unquoted. Empty when absent.
    pub rel: String,
}

/// Parses a `Link` header into its relations.
///
/// Entries that do not follow the `<url>; params` shape are skipped rather
/// than failing the whole header.
#[must_use]
pub fn parse_link_header(header: &str) -> Vec<LinkRelation> {
    header
        .split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            let url = entry.strip_prefix('<')?;
            let (url, params) = url.split_once('>')?;
            let rel = params
                .split(';')
                .filter_map(|param| param.trim().split_once('='))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("rel"))
                .map(|(_, value)| value.trim().trim_matches('"').to_string())
                .unwrap_or_default();
            Some(LinkRelation {
                url: url.to_string(),
                rel,
            })
        })
        .collect()
}

/// Extracts the next-page continuation token from a `Link` header.
///
/// Returns `None` when there is no `rel="next"` relation, its URL does not
/// parse, or the `page_info` parameter is absent or empty.
#[must_use]
pub fn next_page_info(header: &str) -> Option<String> {
    let next = parse_link_header(header)
        .into_iter()
        .find(|relation| relation.rel == "next")?;
    let url = Url::parse(&next.url).ok()?;
    let token = url
        .query_pairs()
        .find(|(name, _)| name == PAGE_INFO_PARAM)
        .map(|(_, value)| value.into_owned())?;
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NEXT_ONLY: &str =
        "<https://x.myshopify.com/admin/api/2024-04/products.json?limit=250&page_info=tok123>; rel=\"next\"";

    const PREV_AND_NEXT: &str = "<https://x.myshopify.com/admin/api/2024-04/products.json?page_info=before>; rel=\"previous\", <https://x.myshopify.com/admin/api/2024-04/products.json?page_info=after>; rel=\"next\"";

    #[test]
    fn test_parse_single_relation() {
        let relations = parse_link_header(NEXT_ONLY);
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].rel, "next");
        assert!(relations[0].url.contains("page_info=tok123"));
    }

    #[test]
    fn test_parse_multiple_relations() {
        let relations = parse_link_header(PREV_AND_NEXT);
        assert_eq!(relations.len(), 2);
        assert_eq!(relations[0].rel, "previous");
        assert_eq!(relations[1].rel, "next");
    }

    #[test]
    fn test_parse_skips_malformed_entries() {
        let relations = parse_link_header("garbage, <https://a.example/x>; rel=\"next\"");
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].url, "https://a.example/x");
    }

    #[test]
    fn test_next_page_info_extracts_token() {
        assert_eq!(next_page_info(NEXT_ONLY), Some("tok123".to_string()));
    }

    #[test]
    fn test_next_page_info_picks_next_relation() {
        assert_eq!(next_page_info(PREV_AND_NEXT), Some("after".to_string()));
    }

    #[test]
    fn test_next_page_info_none_without_next() {
        let header = "<https://a.example/x?page_info=tok>; rel=\"previous\"";
        assert_eq!(next_page_info(header), None);
    }

    #[test]
    fn test_next_page_info_none_for_empty_token() {
        let header = "<https://a.example/x?page_info=>; rel=\"next\"";
        assert_eq!(next_page_info(header), None);
    }

    #[test]
    fn test_next_page_info_none_without_param() {
        let header = "<https://a.example/x?limit=250>; rel=\"next\"";
        assert_eq!(next_page_info(header), None);
    }

    #[test]
    fn test_next_page_info_none_for_empty_header() {
        assert_eq!(next_page_info(""), None);
    }
}
