//! Upstream content sources.
//!
//! Each source module exports:
//! - `index_pages(source, spec)`: Returns the ordered list of page URLs
//! - `fetch_pages(source, urls)`: Fetches and decodes those pages, in order
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | The Guardian | [`guardian`] | Content API `/search` | Requires API key |

pub mod guardian;
