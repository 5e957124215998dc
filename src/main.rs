//! CLI entry point for imgharvest.

use std::process::ExitCode;

mod app;
mod app_config;
mod cli;
mod output;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// The run completed, even if some images failed or were filtered.
    Success,
    /// Arguments or configuration were invalid.
    ArgumentError,
    /// The page, its markup, or the output directory was unusable.
    Fatal,
    /// The operator interrupted the run.
    Interrupted,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::ArgumentError => 1,
            Self::Fatal => 2,
            Self::Interrupted => 130,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

// One thread: images are fetched, checked, and written strictly one after another.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    app::runtime::run_imgharvest().await.into()
}
