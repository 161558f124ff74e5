//! CSV output for the exported [`ResultTable`].
//!
//! Column order is fixed by [`Column::ALL`] and applied only here, at
//! serialization time. The row index is not written.
//!
//! The whole file is rendered in memory before anything touches disk, so a
//! failure while rendering never leaves a half-written CSV behind.

use chrono::SecondsFormat;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::error::{PipelineError, Result};
use crate::models::{ArticleRow, ResultTable};

/// One output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Type,
    SectionId,
    SectionName,
    WebPublicationDate,
    FormattedDate,
    Year,
    WebTitle,
    WebUrl,
    ApiUrl,
    IsHosted,
    PillarId,
    PillarName,
    Wordcount,
}

impl Column {
    /// Header order of the CSV file.
    pub const ALL: [Column; 14] = [
        Column::Id,
        Column::Type,
        Column::SectionId,
        Column::SectionName,
        Column::WebPublicationDate,
        Column::FormattedDate,
        Column::Year,
        Column::WebTitle,
        Column::WebUrl,
        Column::ApiUrl,
        Column::IsHosted,
        Column::PillarId,
        Column::PillarName,
        Column::Wordcount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Type => "type",
            Column::SectionId => "sectionId",
            Column::SectionName => "sectionName",
            Column::WebPublicationDate => "webPublicationDate",
            Column::FormattedDate => "formatted_date",
            Column::Year => "year",
            Column::WebTitle => "webTitle",
            Column::WebUrl => "webUrl",
            Column::ApiUrl => "apiUrl",
            Column::IsHosted => "isHosted",
            Column::PillarId => "pillarId",
            Column::PillarName => "pillarName",
            Column::Wordcount => "Wordcount",
        }
    }

    /// Render this column's cell for `row`.
    pub fn value(self, row: &ArticleRow) -> String {
        match self {
            Column::Id => row.id.clone(),
            Column::Type => row.kind.clone(),
            Column::SectionId => row.section_id.clone(),
            Column::SectionName => row.section_name.clone(),
            Column::WebPublicationDate => row
                .web_publication_date
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Column::FormattedDate => row.formatted_date.clone(),
            Column::Year => row.year.to_string(),
            Column::WebTitle => row.web_title.clone(),
            Column::WebUrl => row.web_url.clone(),
            Column::ApiUrl => row.api_url.clone(),
            Column::IsHosted => row.is_hosted.to_string(),
            Column::PillarId => row.pillar_id.clone().unwrap_or_default(),
            Column::PillarName => row.pillar_name.clone().unwrap_or_default(),
            Column::Wordcount => row.wordcount.to_string(),
        }
    }
}

/// Render the table as CSV bytes: header row, then one record per row.
pub fn render_csv(table: &ResultTable) -> Result<Vec<u8>> {
    let mut wtr = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    wtr.write_record(Column::ALL.iter().map(|c| c.name()))?;
    for row in &table.rows {
        wtr.write_record(Column::ALL.iter().map(|c| c.value(row)))?;
    }

    wtr.into_inner()
        .map_err(|e| PipelineError::Io(e.into_error()))
}

/// Write the table to `path`, replacing any existing file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = table.len()))]
pub async fn write_table(table: &ResultTable, path: &Path) -> Result<()> {
    let bytes = render_csv(table)?;
    fs::write(path, &bytes).await?;
    info!(bytes = bytes.len(), "Wrote CSV file");
    Ok(())
}
