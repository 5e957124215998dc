//! Exit code logic for the imgharvest process.
//!
//! Single responsibility: map how a run ended to the process exit outcome.

use imgharvest_core::{PipelineError, RunResult};

use crate::ProcessExit;

/// Exit outcome for a clap parse error. Help and version requests are not failures.
pub(crate) fn clap_exit_outcome(kind: clap::error::ErrorKind) -> ProcessExit {
    use clap::error::ErrorKind;
    match kind {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ProcessExit::Success,
        _ => ProcessExit::ArgumentError,
    }
}

/// Exit outcome for a finished pipeline run.
///
/// Per-image failures and filters still count as a completed run.
pub(crate) fn determine_exit_outcome(result: &Result<RunResult, PipelineError>) -> ProcessExit {
    match result {
        Ok(_) => ProcessExit::Success,
        Err(_) => ProcessExit::Fatal,
    }
}
