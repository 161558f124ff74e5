//! Command-line interface definitions for Guardian Longreads.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Only the API key is required; it is normally picked up from the `API_KEY`
//! environment variable, which `main` loads from a local `.env` first.

use clap::Parser;
use std::path::PathBuf;

use crate::models::{PageCount, QuerySpec};
use crate::pipeline::RunSettings;
use crate::transform::DEFAULT_MIN_WORDCOUNT;

/// Command-line arguments for the Guardian Longreads exporter.
///
/// # Examples
///
/// ```sh
/// # Defaults: "elections OR Brexit", first 2 pages, >= 1000 words, ./data.csv
/// guardian_longreads
///
/// # Explicit page count, no cap, different query
/// guardian_longreads -q "climate AND policy" --pages 5 --max-pages 0 -o climate.csv
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Guardian content API key
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Search endpoint
    #[arg(long, default_value = "https://content.guardianapis.com/search")]
    pub endpoint: String,

    /// Search expression (supports AND / OR / NOT)
    #[arg(short, long, default_value = "elections OR Brexit")]
    pub query: String,

    /// Extra fields to request for each result
    #[arg(long, default_value = "wordcount")]
    pub show_fields: String,

    /// Number of pages to index; probes the API for the total when omitted
    #[arg(long)]
    pub pages: Option<u32>,

    /// Fetch at most this many pages (0 = no cap)
    #[arg(long, default_value_t = 2)]
    pub max_pages: usize,

    /// Drop articles with fewer words than this
    #[arg(long, default_value_t = DEFAULT_MIN_WORDCOUNT)]
    pub min_wordcount: u64,

    /// Output CSV path
    #[arg(short, long, default_value = "data.csv")]
    pub output: PathBuf,
}

impl Cli {
    /// Resolve the parsed arguments into the settings a run is driven by.
    pub fn settings(&self) -> RunSettings {
        RunSettings {
            spec: QuerySpec::new(
                self.endpoint.clone(),
                self.query.clone(),
                self.api_key.clone(),
                self.show_fields.clone(),
                PageCount::from(self.pages),
            ),
            max_pages: (self.max_pages > 0).then_some(self.max_pages),
            min_wordcount: self.min_wordcount,
            output: self.output.clone(),
        }
    }
}
