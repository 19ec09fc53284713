//! Lazy page enumeration over the Admin API's two pagination encodings.
//!
//! The Admin API paginates REST collections with an opaque `page_info`
//! token advertised in the `Link` response header, and GraphQL connections
//! with a `pageInfo { hasNextPage endCursor }` object in the body. Both are
//! exposed here as pull-based pagers with the same shape: call `next_page()`
//! until it returns `Ok(None)`.
//!
//! # Contract
//!
//! - Each page is yielded whole, in server order, before the next is fetched.
//! - An empty page terminates enumeration even if a next-page signal is
//!   present, as a guard against server-side inconsistency.
//! - A transport error is terminal for the enumeration; pages already
//!   yielded remain valid, but no further pages will be produced.
//! - Cursors are never persisted; an enumeration restarts from the beginning
//!   only.

mod cursor;
mod link;
mod rest;

pub use cursor::CursorPager;
pub use link::{LinkRelation, next_page_info, parse_link_header};
pub use rest::{PAGE_LIMIT, RestPager};
