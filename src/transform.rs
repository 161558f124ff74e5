//! Enrich, sort and filter flattened records into the exported [`ResultTable`].
//!
//! The steps run in a fixed order:
//!
//! 1. Parse `webPublicationDate` (fails the run on the first bad value)
//! 2. Derive `year`
//! 3. Stable sort by publication date, newest first
//! 4. Derive `formatted_date` (`DD/MM/YYYY`)
//! 5. Coerce `Wordcount` to a number, unparseable values become null
//! 6. Drop rows whose word count is null or below the threshold
//! 7. Re-index the survivors from zero
//!
//! Column order is not decided here; see [`crate::outputs::csv`].

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::{PipelineError, Result};
use crate::models::{ArticleRecord, ArticleRow, ResultTable};

/// Default minimum word count for a row to be kept.
pub const DEFAULT_MIN_WORDCOUNT: u64 = 1000;

/// `strftime` pattern for the `formatted_date` column.
pub const FORMATTED_DATE: &str = "%d/%m/%Y";

/// Parse a publication timestamp into UTC.
///
/// RFC 3339 is what the API sends. Offset-less date-times and bare dates are
/// accepted as UTC.
pub fn parse_publication_date(
    value: &str,
) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    let value = value.trim();
    let rfc3339_err = match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => return Ok(dt.with_timezone(&Utc)),
        Err(e) => e,
    };
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(rfc3339_err)
}

/// Coerce a raw word count to a number.
///
/// Numbers pass through; strings are parsed after trimming. Everything else
/// (missing, null, booleans, unparseable or non-finite values) is `None`.
pub fn coerce_wordcount(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Run the full enrichment pipeline over flattened records.
#[instrument(
    level = "info",
    skip_all,
    fields(records = records.len(), min_wordcount = min_wordcount)
)]
pub fn transform(records: Vec<ArticleRecord>, min_wordcount: u64) -> Result<ResultTable> {
    let mut dated = records
        .into_iter()
        .map(|record| {
            let published = parse_publication_date(&record.web_publication_date).map_err(|e| {
                PipelineError::InvalidDate {
                    id: record.id.clone(),
                    value: record.web_publication_date.clone(),
                    source: e,
                }
            })?;
            Ok((published, record))
        })
        .collect::<Result<Vec<_>>>()?;

    // `sort_by` is stable: equal timestamps keep their page order.
    dated.sort_by(|(a, _), (b, _)| b.cmp(a));

    let total = dated.len();
    let threshold = min_wordcount as f64;
    let rows: Vec<ArticleRow> = dated
        .into_iter()
        .filter_map(|(published, record)| {
            let wordcount = match coerce_wordcount(record.wordcount.as_ref()) {
                Some(n) if n >= threshold => n,
                other => {
                    debug!(
                        id = %record.id,
                        wordcount = ?other,
                        "Dropping record below word count threshold"
                    );
                    return None;
                }
            };
            Some(ArticleRow {
                index: 0,
                id: record.id,
                kind: record.kind,
                section_id: record.section_id,
                section_name: record.section_name,
                web_publication_date: published,
                formatted_date: published.format(FORMATTED_DATE).to_string(),
                year: published.year(),
                web_title: record.web_title,
                web_url: record.web_url,
                api_url: record.api_url,
                is_hosted: record.is_hosted,
                pillar_id: record.pillar_id,
                pillar_name: record.pillar_name,
                wordcount,
            })
        })
        .enumerate()
        .map(|(index, row)| ArticleRow { index, ..row })
        .collect();

    info!(kept = rows.len(), dropped = total - rows.len(), "Transformed records");
    Ok(ResultTable { rows })
}
