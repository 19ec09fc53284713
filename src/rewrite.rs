//! Shipped description transform: Shopify-CDN `.jpeg` → `.jpg` rewriting.
//!
//! Rewrites image URLs inside product description HTML so every `.jpeg`
//! reference to the store's CDN becomes `.jpg`, preserving query strings.
//! Covers `src`/`href` attribute values, `srcset` lists (per entry, keeping
//! width/density descriptors), and CSS `url(...)` occurrences inside
//! `style` attributes that set a background image. Non-CDN URLs are left
//! untouched.
//!
//! The sync engine treats any transform as an opaque `Fn(&str) -> String`;
//! this module is just the default one the CLI ships.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

/// Host substrings identifying the store CDN (heuristic).
const CDN_SNIPPETS: [&str; 3] = ["cdn.shopify", ".myshopify", "shopifycdn"];

#[allow(clippy::expect_used)]
static ATTR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(src|href|srcset)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute regex is valid")
});

#[allow(clippy::expect_used)]
static STYLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bstyle\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("style regex is valid")
});

#[allow(clippy::expect_used)]
static CSS_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\((['"]?)([^)'"]+)['"]?\)"#).expect("css url regex is valid")
});

/// Rewrites every CDN image reference in a description.
///
/// Pure function over the HTML text; returns the input unchanged (same
/// string value) when nothing needed rewriting, so callers comparing
/// before/after see no spurious difference.
#[must_use]
pub fn clean_description(html: &str) -> String {
    let pass1 = ATTR_PATTERN.replace_all(html, rewrite_attribute);
    let pass2 = STYLE_PATTERN.replace_all(&pass1, rewrite_style_attribute);
    pass2.into_owned()
}

/// Rewrites one `cdn` URL: `.jpeg` → `.jpg` on the path, query preserved.
///
/// Returns the input unchanged for non-CDN hosts, unparseable URLs, and
/// paths not ending in `.jpeg`.
#[must_use]
pub fn rewrite_url(url: &str) -> String {
    if !is_shopify_cdn(url) {
        return url.to_string();
    }
    let cut = url.find(['?', '#']).unwrap_or(url.len());
    let (base, rest) = url.split_at(cut);
    if base.len() >= 5 && base[base.len() - 5..].eq_ignore_ascii_case(".jpeg") {
        format!("{}.jpg{rest}", &base[..base.len() - 5])
    } else {
        url.to_string()
    }
}

/// Rewrites each entry of a `srcset` list, preserving descriptors.
#[must_use]
pub fn rewrite_srcset(srcset: &str) -> String {
    srcset
        .split(',')
        .map(|part| {
            let part = part.trim();
            match part.split_once(' ') {
                Some((url, descriptor)) => format!("{} {descriptor}", rewrite_url(url)),
                None => rewrite_url(part),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whether a URL points at the store CDN.
fn is_shopify_cdn(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .is_some_and(|host| CDN_SNIPPETS.iter().any(|piece| host.contains(piece)))
}

/// Replacement for one `src`/`href`/`srcset` attribute match.
///
/// Keeps the original attribute text byte-for-byte when the value does not
/// change, and splices only the value span when it does.
fn rewrite_attribute(caps: &Captures<'_>) -> String {
    let Some(value) = caps.get(2).or_else(|| caps.get(3)) else {
        return caps[0].to_string();
    };
    let attr = caps[1].to_ascii_lowercase();
    let rewritten = if attr == "srcset" {
        rewrite_srcset(value.as_str())
    } else {
        rewrite_url(value.as_str())
    };
    splice_value(caps, value, &rewritten)
}

/// Replacement for one `style` attribute match: rewrites `url(...)` targets
/// when the style sets a background image.
fn rewrite_style_attribute(caps: &Captures<'_>) -> String {
    let Some(value) = caps.get(1).or_else(|| caps.get(2)) else {
        return caps[0].to_string();
    };
    if !value.as_str().to_ascii_lowercase().contains("background-image") {
        return caps[0].to_string();
    }
    let rewritten = CSS_URL_PATTERN.replace_all(value.as_str(), |url_caps: &Captures<'_>| {
        let quote = &url_caps[1];
        format!("url({quote}{}{quote})", rewrite_url(&url_caps[2]))
    });
    splice_value(caps, value, &rewritten)
}

/// Rebuilds a full attribute match with only the value span replaced.
fn splice_value(caps: &Captures<'_>, value: regex::Match<'_>, rewritten: &str) -> String {
    let whole = match caps.get(0) {
        Some(whole) => whole,
        None => return rewritten.to_string(),
    };
    if value.as_str() == rewritten {
        return whole.as_str().to_string();
    }
    let start = value.start() - whole.start();
    let end = value.end() - whole.start();
    let text = whole.as_str();
    format!("{}{rewritten}{}", &text[..start], &text[end..])
}
