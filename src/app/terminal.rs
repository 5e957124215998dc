//! Terminal capability checks and tracing setup.

pub(crate) fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_disable_color(no_color_env: bool, dumb_terminal: bool) -> bool {
    no_color_env || dumb_terminal
}

pub(crate) fn is_no_color_requested() -> bool {
    should_disable_color(no_color_env_requested(), is_dumb_terminal())
}

pub(crate) fn should_use_progress_bar(
    stderr_is_terminal: bool,
    no_progress: bool,
    json: bool,
    dumb_terminal: bool,
) -> bool {
    stderr_is_terminal && !no_progress && !json && !dumb_terminal
}

/// Default filter directive: our own targets at `info` (or `debug` when
/// verbose), every dependency at `warn`.
pub(crate) fn default_log_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("warn,imgharvest={level},imgharvest_core={level}")
}

/// Installs the stderr subscriber. `RUST_LOG` wins over `default_directive`.
pub(crate) fn init_tracing(default_directive: &str, no_color: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}
