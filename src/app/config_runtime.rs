use std::ffi::OsString;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use imgharvest_core::{RunConfig, SizeBounds};

use crate::app_config::FileConfig;
use crate::cli::Args;

/// Which flags were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) min_width: bool,
    pub(crate) min_height: bool,
    pub(crate) max_width: bool,
    pub(crate) max_height: bool,
    pub(crate) timeout: bool,
    pub(crate) render_timeout: bool,
    pub(crate) verbose: bool,
    pub(crate) render: bool,
    pub(crate) capture: bool,
}

/// Everything the binary needs after arguments and config file are merged.
#[derive(Debug, Clone)]
pub(crate) struct CliSettings {
    pub(crate) run: RunConfig,
    pub(crate) json: bool,
    pub(crate) no_progress: bool,
}

pub(crate) fn parse_cli_with_sources() -> Result<(Args, CliValueSources), clap::Error> {
    parse_cli_from(std::env::args_os())
}

pub(crate) fn parse_cli_from<I, T>(argv: I) -> Result<(Args, CliValueSources), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = Args::command().try_get_matches_from(argv)?;
    let args = Args::from_arg_matches(&matches)?;

    let sources = CliValueSources {
        min_width: is_commandline_value(&matches, "min_width"),
        min_height: is_commandline_value(&matches, "min_height"),
        max_width: is_commandline_value(&matches, "max_width"),
        max_height: is_commandline_value(&matches, "max_height"),
        timeout: is_commandline_value(&matches, "timeout"),
        render_timeout: is_commandline_value(&matches, "render_timeout"),
        verbose: is_switch_given(&matches, "verbose", "no_verbose"),
        render: is_switch_given(&matches, "render", "no_render"),
        capture: is_switch_given(&matches, "capture", "no_capture"),
    };
    Ok((args, sources))
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Either side of an on/off flag pair was given, so the config file must not
/// override it.
fn is_switch_given(matches: &ArgMatches, on: &str, off: &str) -> bool {
    is_commandline_value(matches, on) || is_commandline_value(matches, off)
}

/// Fills every flag not given on the command line from `file_config`.
pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Args {
    let Some(file_config) = file_config else {
        return args;
    };

    if !cli_sources.min_width && file_config.min_width.is_some() {
        args.min_width = file_config.min_width;
    }
    if !cli_sources.min_height && file_config.min_height.is_some() {
        args.min_height = file_config.min_height;
    }
    if !cli_sources.max_width && file_config.max_width.is_some() {
        args.max_width = file_config.max_width;
    }
    if !cli_sources.max_height && file_config.max_height.is_some() {
        args.max_height = file_config.max_height;
    }
    if !cli_sources.timeout
        && let Some(timeout) = file_config.timeout_secs
    {
        args.timeout = timeout;
    }
    if !cli_sources.render_timeout
        && let Some(render_timeout) = file_config.render_timeout_secs
    {
        args.render_timeout = render_timeout;
    }
    if !cli_sources.verbose
        && let Some(verbose) = file_config.verbose
    {
        args.verbose = verbose;
    }
    if !cli_sources.render
        && let Some(render) = file_config.render
    {
        args.render = render;
    }
    if !cli_sources.capture
        && let Some(capture) = file_config.capture
    {
        args.capture = capture;
    }
    args
}

/// Validates the merged arguments and builds the immutable run configuration.
pub(crate) fn build_settings(args: Args) -> Result<CliSettings> {
    let bounds = SizeBounds {
        min_width: args.min_width,
        min_height: args.min_height,
        max_width: args.max_width,
        max_height: args.max_height,
    };
    bounds.validate()?;

    if args.output_dir.exists() && !args.output_dir.is_dir() {
        bail!(
            "Output path '{}' exists and is not a directory",
            args.output_dir.display()
        );
    }

    if !cfg!(feature = "render") {
        if args.capture {
            bail!("--capture is not available in this build (rebuild with the `render` feature)");
        }
        if args.render {
            bail!("--render is not available in this build (rebuild with the `render` feature)");
        }
    }

    let run = RunConfig::new(args.url, args.output_dir)
        .with_bounds(bounds)
        .with_verbose(args.verbose)
        .with_render(args.render)
        .with_capture(args.capture)
        .with_timeout(Duration::from_secs(args.timeout))
        .with_render_timeout(Duration::from_secs(args.render_timeout));

    Ok(CliSettings {
        run,
        json: args.json,
        no_progress: args.no_progress,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const URL: &str = "https://example.com/";

    fn parse(extra: &[&str]) -> (Args, CliValueSources) {
        let mut argv = vec!["imgharvest", URL, "out"];
        argv.extend_from_slice(extra);
        parse_cli_from(argv).expect("args should parse")
    }

    #[test]
    fn test_sources_track_explicit_flags_only() {
        let (_, sources) = parse(&["--min-width", "5", "-v"]);
        assert!(sources.min_width);
        assert!(sources.verbose);
        assert!(!sources.min_height);
        assert!(!sources.timeout);
        assert!(!sources.render_timeout);
        assert!(!sources.render);
        assert!(!sources.capture);
    }

    #[test]
    fn test_parse_cli_from_surfaces_clap_errors() {
        let err = parse_cli_from(["imgharvest", URL]).expect_err("missing output dir");
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_config_fills_unset_flags() {
        let (args, sources) = parse(&[]);
        let file = FileConfig {
            min_width: Some(100),
            max_height: Some(900),
            timeout_secs: Some(42),
            verbose: Some(true),
            ..FileConfig::default()
        };

        let merged = apply_config_defaults(args, &sources, Some(&file));
        assert_eq!(merged.min_width, Some(100));
        assert_eq!(merged.max_height, Some(900));
        assert_eq!(merged.min_height, None);
        assert_eq!(merged.timeout, 42);
        assert!(merged.verbose);
    }

    #[test]
    fn test_command_line_wins_over_config() {
        let (args, sources) = parse(&["--min-width", "7", "--timeout", "3"]);
        let file = FileConfig {
            min_width: Some(100),
            timeout_secs: Some(42),
            ..FileConfig::default()
        };

        let merged = apply_config_defaults(args, &sources, Some(&file));
        assert_eq!(merged.min_width, Some(7));
        assert_eq!(merged.timeout, 3);
    }

    #[test]
    fn test_negation_flags_beat_config_file() {
        let (args, sources) = parse(&["--no-verbose", "--no-render", "--no-capture"]);
        assert!(sources.verbose);
        assert!(sources.render);
        assert!(sources.capture);
        let file = FileConfig {
            verbose: Some(true),
            render: Some(true),
            capture: Some(true),
            ..FileConfig::default()
        };

        let merged = apply_config_defaults(args, &sources, Some(&file));
        assert!(!merged.verbose);
        assert!(!merged.render);
        assert!(!merged.capture);
    }

    #[test]
    fn test_config_fills_capture_and_render_timeout() {
        let (args, sources) = parse(&[]);
        let file = FileConfig {
            capture: Some(true),
            render_timeout_secs: Some(120),
            ..FileConfig::default()
        };

        let merged = apply_config_defaults(args, &sources, Some(&file));
        assert!(merged.capture);
        assert_eq!(merged.render_timeout, 120);
    }

    #[test]
    fn test_no_config_leaves_args_untouched() {
        let (args, sources) = parse(&["--max-width", "50"]);
        let merged = apply_config_defaults(args, &sources, None);
        assert_eq!(merged.max_width, Some(50));
        assert_eq!(merged.timeout, 10);
    }

    #[test]
    fn test_build_settings_maps_args() {
        let (args, _) = parse(&["--min-height", "64", "--timeout", "5", "--json", "--no-progress"]);
        let settings = build_settings(args).expect("valid settings");
        assert_eq!(settings.run.url(), URL);
        assert_eq!(settings.run.output_dir(), Path::new("out"));
        assert_eq!(settings.run.bounds().min_height, Some(64));
        assert_eq!(settings.run.timeout(), Duration::from_secs(5));
        assert_eq!(settings.run.render_timeout(), Duration::from_secs(30));
        assert!(settings.json);
        assert!(settings.no_progress);
    }

    #[test]
    fn test_build_settings_rejects_min_above_max() {
        let (args, _) = parse(&["--min-width", "500", "--max-width", "100"]);
        let err = build_settings(args).expect_err("inverted bounds");
        assert!(err.to_string().contains("--min-width 500"));
    }

    #[test]
    fn test_build_settings_rejects_output_path_that_is_a_file() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let file = temp.path().join("occupied");
        std::fs::write(&file, b"x").expect("write file");
        let file_arg = file.to_string_lossy().into_owned();

        let (args, _) =
            parse_cli_from(["imgharvest", URL, file_arg.as_str()]).expect("args should parse");
        let err = build_settings(args).expect_err("file as output dir");
        assert!(err.to_string().contains("not a directory"));
    }

    #[cfg(not(feature = "render"))]
    #[test]
    fn test_build_settings_rejects_render_without_feature() {
        let (args, _) = parse(&["--render"]);
        let err = build_settings(args).expect_err("render unavailable");
        assert!(err.to_string().contains("--render"));
    }

    #[cfg(not(feature = "render"))]
    #[test]
    fn test_build_settings_rejects_capture_without_feature() {
        let (args, _) = parse(&["--capture"]);
        let err = build_settings(args).expect_err("capture unavailable");
        assert!(err.to_string().contains("--capture"));
    }

    #[cfg(feature = "render")]
    #[test]
    fn test_build_settings_maps_browser_options() {
        let (args, _) = parse(&["--capture", "--render-timeout", "75"]);
        let settings = build_settings(args).expect("valid settings");
        assert!(settings.run.capture());
        assert_eq!(settings.run.render_timeout(), Duration::from_secs(75));
    }
}
