//! Error taxonomy for the export pipeline.
//!
//! Every variant is fatal: it propagates up to `main` and aborts the run
//! before the CSV file is written. The two recoverable conditions (a short
//! final page and a non-numeric word count) never surface as errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Transport failure or a non-2xx status from the search API.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the JSON shape we expect.
    #[error("Could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The probe response did not carry `response.pages`.
    #[error("Missing or malformed pagination metadata from {url}: {source}")]
    Pagination {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Article {id} has an unparseable webPublicationDate {value:?}: {source}")]
    InvalidDate {
        id: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
