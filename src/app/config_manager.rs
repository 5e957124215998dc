//! Configuration lifecycle: load the config file, merge CLI, validate.

use anyhow::Result;

use crate::app::config_runtime::{self, CliSettings, CliValueSources};
use crate::app_config::load_default_file_config;
use crate::cli::Args;

/// Loads the default config file, merges it under the CLI flags, and validates the result.
pub(crate) fn resolve_config(args: Args, cli_sources: &CliValueSources) -> Result<CliSettings> {
    let file_config = load_default_file_config()?;
    let merged = config_runtime::apply_config_defaults(args, cli_sources, file_config.as_ref());
    config_runtime::build_settings(merged)
}
