use std::io::{self, IsTerminal};

use imgharvest_core::Pipeline;
use tracing::{debug, info, warn};

use crate::app::{config_manager, config_runtime, exit_handler, progress_manager, terminal};
use crate::{ProcessExit, output};

pub(crate) async fn run_imgharvest() -> ProcessExit {
    let (args, cli_sources) = match config_runtime::parse_cli_with_sources() {
        Ok(parsed) => parsed,
        Err(err) => {
            let _ = err.print();
            return exit_handler::clap_exit_outcome(err.kind());
        }
    };

    let settings = match config_manager::resolve_config(args, &cli_sources) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ProcessExit::ArgumentError;
        }
    };

    terminal::init_tracing(
        &terminal::default_log_directive(settings.run.verbose()),
        terminal::is_no_color_requested(),
    );
    debug!(config = ?settings.run, "configuration resolved");
    info!(
        url = %settings.run.url(),
        output_dir = %settings.run.output_dir().display(),
        bounds = %settings.run.bounds(),
        render = settings.run.render(),
        capture = settings.run.capture(),
        "imgharvest starting"
    );

    let pipeline = match Pipeline::for_config(&settings.run) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            eprintln!("error: {err}");
            return ProcessExit::Fatal;
        }
    };

    let use_bar = terminal::should_use_progress_bar(
        io::stderr().is_terminal(),
        settings.no_progress,
        settings.json,
        terminal::is_dumb_terminal(),
    );
    let mut reporter =
        progress_manager::ProgressReporter::new(use_bar, settings.run.verbose(), settings.json);

    let finished = tokio::select! {
        result = pipeline.run(&settings.run, &mut reporter) => Some(result),
        Ok(()) = tokio::signal::ctrl_c() => None,
    };

    let Some(result) = finished else {
        reporter.abandon();
        warn!("interrupted; images already saved are left in place");
        return ProcessExit::Interrupted;
    };

    let exit = exit_handler::determine_exit_outcome(&result);
    match result {
        Ok(run_result) => {
            reporter.finish();
            if let Err(err) = output::print_run_result(&run_result, settings.json) {
                eprintln!("error: {err:#}");
                return ProcessExit::Fatal;
            }
        }
        Err(err) => {
            reporter.abandon();
            eprintln!("error: {err}");
        }
    }
    exit
}
