//! # Guardian Longreads
//!
//! Pulls article metadata from the Guardian content search API, keeps the
//! long-form pieces and writes them to a CSV file.
//!
//! ## Usage
//!
//! ```sh
//! echo 'API_KEY=...' > .env
//! guardian_longreads -q "elections OR Brexit" -o data.csv
//! ```
//!
//! ## Architecture
//!
//! The application follows a strictly sequential pipeline:
//! 1. **Indexing**: Work out how many result pages exist and build one URL per page
//! 2. **Fetching**: Download and decode each page in order
//! 3. **Flattening**: Pull a fixed field set out of every result item
//! 4. **Transforming**: Derive `year`/`formatted_date`, sort newest first,
//!    drop anything under the word-count threshold
//! 5. **Output**: Write the surviving rows to CSV

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cli;
mod error;
mod flatten;
mod models;
mod outputs;
mod pipeline;
mod sources;
mod transform;
mod utils;

use api::HttpPageSource;
use cli::Cli;
use utils::ensure_writable_parent;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("guardian_longreads starting up");

    // A missing .env is fine; API_KEY may already be in the environment.
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => return Err(e.into()),
    }

    let args = Cli::parse();
    let settings = args.settings();
    debug!(?settings, "Resolved run settings");

    if let Err(e) = ensure_writable_parent(&settings.output).await {
        error!(
            path = %settings.output.display(),
            error = %e,
            "Output location is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let source = HttpPageSource::new()?;
    let summary = match pipeline::run(&source, &settings).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Export failed; no output written");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        pages_indexed = summary.pages_indexed,
        pages_fetched = summary.pages_fetched,
        records = summary.records,
        rows_written = summary.rows_written,
        path = %settings.output.display(),
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
