//! Data models for search queries, API pages and exported article rows.
//!
//! This module defines the core data structures used throughout the application:
//! - [`QuerySpec`]: The immutable search query a run is built from
//! - [`SearchPage`]: One decoded page of the Guardian search API
//! - [`ArticleRecord`]: A flattened search result, before enrichment
//! - [`ArticleRow`] / [`ResultTable`]: Enriched, filtered rows ready for CSV
//!
//! The API models use camelCase field names to match the Guardian JSON, hence
//! the `rename_all` attributes.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use url::Url;

use crate::error::Result;

/// How many result pages a run should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCount {
    /// Use exactly this many pages, no probe request.
    Explicit(u32),
    /// Probe the API once and read `response.pages`.
    Discover,
}

impl From<Option<u32>> for PageCount {
    fn from(pages: Option<u32>) -> Self {
        pages.map_or(PageCount::Discover, PageCount::Explicit)
    }
}

/// A search query against the content API.
///
/// Built once per run from the CLI/environment and never mutated. The query
/// parameters keep their insertion order so rendered URLs are stable.
#[derive(Clone, PartialEq, Eq)]
pub struct QuerySpec {
    endpoint: String,
    params: Vec<(String, String)>,
    page_count: PageCount,
}

impl QuerySpec {
    pub fn new(
        endpoint: impl Into<String>,
        query: impl Into<String>,
        api_key: impl Into<String>,
        show_fields: impl Into<String>,
        page_count: PageCount,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: vec![
                ("q".to_string(), query.into()),
                ("api-key".to_string(), api_key.into()),
                ("show-fields".to_string(), show_fields.into()),
            ],
            page_count,
        }
    }

    pub fn page_count(&self) -> PageCount {
        self.page_count
    }

    /// Render the endpoint with every query parameter except `page`.
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse_with_params(
            &self.endpoint,
            self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )?;
        Ok(url)
    }
}

impl fmt::Debug for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| {
                if k == "api-key" {
                    (k.as_str(), "***")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("QuerySpec")
            .field("endpoint", &self.endpoint)
            .field("params", &params)
            .field("page_count", &self.page_count)
            .finish()
    }
}

/// Envelope of every search API response.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    pub response: SearchResponse,
}

/// The `response` object of one page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Total number of pages the query spans. Only the probe relies on it.
    #[serde(default)]
    pub pages: Option<u32>,
    /// Declared maximum number of results per page.
    pub page_size: usize,
    pub results: Vec<SearchResult>,
}

/// Just enough of a response to read the total page count.
#[derive(Debug, Deserialize)]
pub struct PaginationProbe {
    pub response: PaginationMeta,
}

#[derive(Debug, Deserialize)]
pub struct PaginationMeta {
    pub pages: u32,
}

/// A single search hit as returned by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub section_id: String,
    pub section_name: String,
    pub web_publication_date: String,
    pub web_title: String,
    pub web_url: String,
    pub api_url: String,
    pub is_hosted: bool,
    #[serde(default)]
    pub pillar_id: Option<String>,
    #[serde(default)]
    pub pillar_name: Option<String>,
    #[serde(default)]
    pub fields: Option<SearchFields>,
}

/// The `show-fields` sub-object. Word counts arrive as strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFields {
    #[serde(default)]
    pub wordcount: Option<Value>,
}

/// A flattened search hit, one per result item, before any enrichment.
///
/// `wordcount` keeps the raw JSON value; numeric coercion happens in the
/// transform stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub id: String,
    pub kind: String,
    pub section_id: String,
    pub section_name: String,
    pub web_publication_date: String,
    pub web_title: String,
    pub web_url: String,
    pub api_url: String,
    pub is_hosted: bool,
    pub pillar_id: Option<String>,
    pub pillar_name: Option<String>,
    pub wordcount: Option<Value>,
}

impl From<SearchResult> for ArticleRecord {
    fn from(result: SearchResult) -> Self {
        Self {
            id: result.id,
            kind: result.kind,
            section_id: result.section_id,
            section_name: result.section_name,
            web_publication_date: result.web_publication_date,
            web_title: result.web_title,
            web_url: result.web_url,
            api_url: result.api_url,
            is_hosted: result.is_hosted,
            pillar_id: result.pillar_id,
            pillar_name: result.pillar_name,
            wordcount: result.fields.and_then(|f| f.wordcount),
        }
    }
}

/// An enriched article that survived the word-count filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRow {
    /// Contiguous zero-based position in the final table.
    pub index: usize,
    pub id: String,
    pub kind: String,
    pub section_id: String,
    pub section_name: String,
    pub web_publication_date: DateTime<Utc>,
    /// `DD/MM/YYYY` rendering of `web_publication_date`.
    pub formatted_date: String,
    pub year: i32,
    pub web_title: String,
    pub web_url: String,
    pub api_url: String,
    pub is_hosted: bool,
    pub pillar_id: Option<String>,
    pub pillar_name: Option<String>,
    pub wordcount: f64,
}

impl From<ArticleRow> for ArticleRecord {
    /// Turn an exported row back into a raw record so it can be transformed again.
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            section_id: row.section_id,
            section_name: row.section_name,
            web_publication_date: row.web_publication_date.to_rfc3339(),
            web_title: row.web_title,
            web_url: row.web_url,
            api_url: row.api_url,
            is_hosted: row.is_hosted,
            pillar_id: row.pillar_id,
            pillar_name: row.pillar_name,
            wordcount: serde_json::Number::from_f64(row.wordcount).map(Value::Number),
        }
    }
}

/// The final, sorted and filtered table written to CSV.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResultTable {
    pub rows: Vec<ArticleRow>,
}

impl ResultTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[cfg(test)]
    pub fn into_records(self) -> Vec<ArticleRecord> {
        self.rows.into_iter().map(ArticleRecord::from).collect()
    }
}
