//! Output formatting module
//!
//! Provides various output formats for scenario results.

mod formatter;

pub use formatter::{csv_rows, write_results_to_file, OutputFormat, ResultFormatter};
