//! Guardian content search: page enumeration and page fetching.
//!
//! Follows the same two-phase shape as a scraper:
//!
//! 1. **Indexing**: [`index_pages`] turns a [`QuerySpec`] into one URL per
//!    result page, probing the API for the page count when it is not given.
//! 2. **Fetching**: [`fetch_pages`] downloads and decodes every page URL in
//!    order.
//!
//! # URL Pattern
//!
//! `https://content.guardianapis.com/search?q=..&api-key=..&show-fields=wordcount&page=N`
//!
//! Pages are 1-indexed. With [`PageCount::Discover`] the probe request and
//! the page-1 fetch hit the same content twice; the probe is not reused.

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::api::PageSource;
use crate::error::{PipelineError, Result};
use crate::models::{PageCount, PaginationProbe, QuerySpec, SearchPage};
use crate::utils::{redact_api_key, truncate_for_log};

/// Probe the base URL once and read `response.pages`.
#[instrument(level = "info", skip_all, fields(url = %redact_api_key(base_url)))]
pub async fn discover_page_count<S: PageSource>(source: &S, base_url: &Url) -> Result<u32> {
    let body = source.get_body(base_url).await?;
    let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
        warn!(
            error = %e,
            body_preview = %truncate_for_log(&body, 300),
            "Probe body is not JSON"
        );
        PipelineError::Decode {
            url: redact_api_key(base_url),
            source: e,
        }
    })?;
    let probe: PaginationProbe = serde_json::from_value(value).map_err(|e| {
        warn!(
            error = %e,
            body_preview = %truncate_for_log(&body, 300),
            "Probe response has no usable pagination metadata"
        );
        PipelineError::Pagination {
            url: redact_api_key(base_url),
            source: e,
        }
    })?;

    info!(pages = probe.response.pages, "Discovered page count");
    Ok(probe.response.pages)
}

/// Append `page=1..=pages` to the base URL, one URL per page.
pub fn page_urls(base_url: &Url, pages: u32) -> Vec<Url> {
    (1..=pages)
        .map(|page| {
            let mut url = base_url.clone();
            url.query_pairs_mut().append_pair("page", &page.to_string());
            url
        })
        .collect()
}

/// Build the ordered list of page URLs for a query.
///
/// No upper bound is applied here; callers that must respect the API's
/// daily request allowance cap the list before fetching.
#[instrument(level = "info", skip_all, fields(page_count = ?spec.page_count()))]
pub async fn index_pages<S: PageSource>(source: &S, spec: &QuerySpec) -> Result<Vec<Url>> {
    let base_url = spec.base_url()?;
    let pages = match spec.page_count() {
        PageCount::Explicit(n) => n,
        PageCount::Discover => discover_page_count(source, &base_url).await?,
    };

    let urls = page_urls(&base_url, pages);
    info!(count = urls.len(), "Indexed page URLs");
    Ok(urls)
}

/// Fetch and decode a single page.
#[instrument(level = "info", skip_all, fields(url = %redact_api_key(url)))]
pub async fn fetch_page<S: PageSource>(source: &S, url: &Url) -> Result<SearchPage> {
    let body = source.get_body(url).await?;
    let page: SearchPage = serde_json::from_str(&body).map_err(|e| {
        warn!(
            error = %e,
            body_preview = %truncate_for_log(&body, 300),
            "Page body is not a search response"
        );
        PipelineError::Decode {
            url: redact_api_key(url),
            source: e,
        }
    })?;

    debug!(
        pages = ?page.response.pages,
        page_size = page.response.page_size,
        results = page.response.results.len(),
        "Fetched page"
    );
    Ok(page)
}

/// Fetch every page sequentially, preserving input order.
///
/// The first failure aborts the whole batch; there are no partial results.
#[instrument(level = "info", skip_all, fields(count = urls.len()))]
pub async fn fetch_pages<S: PageSource>(source: &S, urls: &[Url]) -> Result<Vec<SearchPage>> {
    let pages: Vec<SearchPage> = stream::iter(urls)
        .then(|url| fetch_page(source, url))
        .try_collect()
        .await?;

    info!(count = pages.len(), "Fetched search pages");
    Ok(pages)
}
