//! The end-to-end export run: index, fetch, flatten, transform, write.
//!
//! Stages run strictly in sequence and every fatal error returns before
//! [`write_table`] is reached, so the output file is either fully replaced or
//! left untouched.

use std::path::PathBuf;
use tracing::{info, instrument, warn};

use crate::api::PageSource;
use crate::error::Result;
use crate::flatten::flatten_pages;
use crate::models::QuerySpec;
use crate::outputs::csv::write_table;
use crate::sources::guardian::{fetch_pages, index_pages};
use crate::transform::transform;

/// Everything a run needs, resolved from CLI and environment.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub spec: QuerySpec,
    /// Fetch at most this many pages; `None` fetches every indexed page.
    pub max_pages: Option<usize>,
    pub min_wordcount: u64,
    pub output: PathBuf,
}

/// Counts reported at the end of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_indexed: usize,
    pub pages_fetched: usize,
    pub records: usize,
    pub rows_written: usize,
}

#[instrument(level = "info", skip_all, fields(output = %settings.output.display()))]
pub async fn run<S: PageSource>(source: &S, settings: &RunSettings) -> Result<RunSummary> {
    let urls = index_pages(source, &settings.spec).await?;

    let to_fetch = match settings.max_pages {
        Some(cap) if cap < urls.len() => {
            warn!(
                indexed = urls.len(),
                cap,
                "Fetching only the first pages to stay within the API request allowance"
            );
            &urls[..cap]
        }
        _ => &urls[..],
    };

    let pages = fetch_pages(source, to_fetch).await?;
    let pages_fetched = pages.len();

    let records = flatten_pages(pages);
    let record_count = records.len();
    info!(count = record_count, "Flattened article records");

    let table = transform(records, settings.min_wordcount)?;
    if table.is_empty() {
        warn!(
            min_wordcount = settings.min_wordcount,
            "No article met the word count threshold; writing header only"
        );
    }
    write_table(&table, &settings.output).await?;

    Ok(RunSummary {
        pages_indexed: urls.len(),
        pages_fetched,
        records: record_count,
        rows_written: table.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{page_body, result_json, FakePageSource};
    use crate::models::PageCount;
    use serde_json::json;
    use std::path::Path;

    fn settings(page_count: PageCount, max_pages: Option<usize>, output: &Path) -> RunSettings {
        RunSettings {
            spec: QuerySpec::new(
                "https://content.guardianapis.com/search",
                "elections OR Brexit",
                "k",
                "wordcount",
                page_count,
            ),
            max_pages,
            min_wordcount: 1000,
            output: output.to_path_buf(),
        }
    }

    fn two_page_source() -> FakePageSource {
        let page1 = page_body(
            2,
            2,
            vec![
                result_json("uk/a", "2024-06-01T08:00:00Z", json!("1200")),
                result_json("uk/b", "2024-06-03T08:00:00Z", json!("800")),
            ],
        );
        let page2 = page_body(
            2,
            2,
            vec![result_json("uk/c", "2024-06-02T08:00:00Z", json!("1500"))],
        );
        FakePageSource::new()
            .with_body(None, page1.clone())
            .with_body(Some(1), page1)
            .with_body(Some(2), page2)
    }

    #[tokio::test]
    async fn test_run_discover_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("data.csv");
        let source = two_page_source();

        let summary = run(&source, &settings(PageCount::Discover, None, &output))
            .await
            .unwrap();

        assert_eq!(
            summary,
            RunSummary {
                pages_indexed: 2,
                pages_fetched: 2,
                records: 3,
                rows_written: 2,
            }
        );
        // Probe and page 1 are separate requests.
        assert_eq!(source.requested_pages(), vec![None, Some(1), Some(2)]);

        let csv = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("uk/c,"));
        assert!(lines[1].ends_with(",1500"));
        assert!(lines[2].starts_with("uk/a,"));
        assert!(lines[2].ends_with(",1200"));
    }

    #[tokio::test]
    async fn test_run_respects_page_cap() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("data.csv");
        let source = two_page_source();

        let summary = run(&source, &settings(PageCount::Explicit(2), Some(1), &output))
            .await
            .unwrap();

        assert_eq!(summary.pages_indexed, 2);
        assert_eq!(summary.pages_fetched, 1);
        assert_eq!(summary.rows_written, 1);
        assert_eq!(source.requested_pages(), vec![Some(1)]);
    }

    #[tokio::test]
    async fn test_run_failure_leaves_output_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("data.csv");
        std::fs::write(&output, "previous run\n").unwrap();

        let source = FakePageSource::new().with_body(
            Some(1),
            page_body(1, 1, vec![result_json("x", "not a date", json!("2000"))]),
        );
        let result = run(&source, &settings(PageCount::Explicit(1), None, &output)).await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous run\n");
    }

    #[tokio::test]
    async fn test_run_fetch_failure_aborts() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("data.csv");
        let source = FakePageSource::new().with_body(Some(1), page_body(2, 1, vec![]));

        let result = run(&source, &settings(PageCount::Explicit(2), None, &output)).await;
        assert!(result.is_err());
        assert!(!output.exists());
    }
}
