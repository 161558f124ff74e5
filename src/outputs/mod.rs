//! Output generation.
//!
//! # Submodules
//!
//! - [`csv`]: Writes the [`ResultTable`](crate::models::ResultTable) to a CSV file
//!
//! # Output Structure
//!
//! ```text
//! ./
//! └── data.csv   # overwritten on every run
//! ```

pub mod csv;
