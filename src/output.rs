//! Final run summary formatting.

use anyhow::{Context, Result};
use imgharvest_core::RunResult;

/// One-line human summary printed after every completed run.
pub(crate) fn summary_line(result: &RunResult) -> String {
    format!(
        "Done: {} succeeded, {} failed, {} filtered ({} total)",
        result.succeeded(),
        result.failed(),
        result.filtered(),
        result.total()
    )
}

/// Pretty-printed JSON of the whole run result.
pub(crate) fn render_json(result: &RunResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("Failed to serialize run result")
}

/// Prints the summary (or JSON) to stdout.
pub(crate) fn print_run_result(result: &RunResult, json: bool) -> Result<()> {
    if json {
        println!("{}", render_json(result)?);
    } else {
        println!("{}", summary_line(result));
    }
    Ok(())
}
