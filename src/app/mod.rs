//! Binary-side orchestration: argument/config resolution, terminal setup,
//! progress reporting, and exit handling around the core pipeline.

pub(crate) mod config_manager;
pub(crate) mod config_runtime;
pub(crate) mod exit_handler;
pub(crate) mod progress_manager;
pub(crate) mod runtime;
pub(crate) mod terminal;
