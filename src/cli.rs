//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use imgharvest_core::{DEFAULT_RENDER_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};

/// Download every image on a web page.
///
/// Fetches the page, finds every `<img>` reference, and saves each image into
/// the output directory under a unique filename, optionally keeping only
/// images within the given size bounds.
#[derive(Parser, Debug, Clone)]
#[command(name = "imgharvest")]
#[command(author, version, about)]
pub struct Args {
    /// Page URL to harvest (http or https)
    #[arg(value_parser = parse_page_url)]
    pub url: String,

    /// Directory to save images into (created if missing)
    pub output_dir: PathBuf,

    /// Skip images narrower than this many pixels
    #[arg(long, value_name = "PX", value_parser = clap::value_parser!(u32).range(1..))]
    pub min_width: Option<u32>,

    /// Skip images shorter than this many pixels
    #[arg(long, value_name = "PX", value_parser = clap::value_parser!(u32).range(1..))]
    pub min_height: Option<u32>,

    /// Skip images wider than this many pixels
    #[arg(long, value_name = "PX", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_width: Option<u32>,

    /// Skip images taller than this many pixels
    #[arg(long, value_name = "PX", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_height: Option<u32>,

    /// Per-request timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: u64,

    /// Browser budget in seconds for launch, navigation and each element capture (1-3600)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_RENDER_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub render_timeout: u64,

    /// Print per-image detail and enable debug logging
    #[arg(short, long, overrides_with = "no_verbose")]
    pub verbose: bool,

    /// Turn off verbose output enabled in the config file
    #[arg(long, overrides_with = "verbose")]
    pub no_verbose: bool,

    /// Render the page in headless Chromium before extracting images
    #[arg(long, overrides_with = "no_render")]
    pub render: bool,

    /// Turn off rendering enabled in the config file
    #[arg(long, overrides_with = "render")]
    pub no_render: bool,

    /// Render the page and save a PNG screenshot of each `<img>` element instead of downloading it
    #[arg(long, overrides_with = "no_capture")]
    pub capture: bool,

    /// Turn off element capture enabled in the config file
    #[arg(long, overrides_with = "capture")]
    pub no_capture: bool,

    /// Print the run result as JSON instead of progress lines
    #[arg(long)]
    pub json: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

fn parse_page_url(raw: &str) -> Result<String, String> {
    let parsed = url::Url::parse(raw).map_err(|e| format!("invalid URL: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.to_string()),
        other => Err(format!("unsupported scheme '{other}', expected http or https")),
    }
}
