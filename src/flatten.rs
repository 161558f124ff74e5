//! Flatten decoded search pages into a single list of [`ArticleRecord`]s.

use tracing::{info, instrument};

use crate::models::{ArticleRecord, SearchPage};

/// Extract one record per result item, in page order then item order.
///
/// Each page contributes at most its declared `pageSize` items. A page that
/// holds fewer items than it declares means the API has run out of data:
/// the available items are kept and flattening stops there.
#[instrument(level = "info", skip_all, fields(pages = pages.len()))]
pub fn flatten_pages(pages: Vec<SearchPage>) -> Vec<ArticleRecord> {
    let mut records = Vec::new();

    for (i, page) in pages.into_iter().enumerate() {
        let declared = page.response.page_size;
        let actual = page.response.results.len();

        records.extend(
            page.response
                .results
                .into_iter()
                .take(declared)
                .map(ArticleRecord::from),
        );

        if actual < declared {
            info!(
                page = i + 1,
                declared,
                actual,
                records = records.len(),
                "Short page reached; all available data has been collected"
            );
            break;
        }
    }

    records
}
