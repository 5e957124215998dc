//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// File-backed defaults for imgharvest flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Default minimum width in pixels.
    pub min_width: Option<u32>,
    /// Default minimum height in pixels.
    pub min_height: Option<u32>,
    /// Default maximum width in pixels.
    pub max_width: Option<u32>,
    /// Default maximum height in pixels.
    pub max_height: Option<u32>,
    /// Default per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Print per-image detail by default.
    pub verbose: Option<bool>,
    /// Render pages in a headless browser by default.
    pub render: Option<bool>,
    /// Capture rendered `<img>` elements as screenshots by default.
    pub capture: Option<bool>,
    /// Default headless-browser budget in seconds.
    pub render_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against the same constraints as the CLI.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("min_width", self.min_width),
            ("min_height", self.min_height),
            ("max_width", self.max_width),
            ("max_height", self.max_height),
        ] {
            if value == Some(0) {
                bail!("Invalid config value for `{field}`: 0. Expected a positive integer");
            }
        }

        for (field, value) in [
            ("timeout_secs", self.timeout_secs),
            ("render_timeout_secs", self.render_timeout_secs),
        ] {
            if let Some(secs) = value
                && !(1..=3600).contains(&secs)
            {
                bail!("Invalid config value for `{field}`: {secs}. Expected range: 1..=3600");
            }
        }

        Ok(())
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/imgharvest/config.toml`
/// 2. `$HOME/.config/imgharvest/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("imgharvest")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("imgharvest")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path, or `None` when no file exists there.
pub fn load_default_file_config() -> Result<Option<FileConfig>> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_file_config(&path).map(Some)
}

pub(crate) fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_number = line_index + 1;

        match key {
            "min_width" => cfg.min_width = Some(parse_pixels(key, value, line_number)?),
            "min_height" => cfg.min_height = Some(parse_pixels(key, value, line_number)?),
            "max_width" => cfg.max_width = Some(parse_pixels(key, value, line_number)?),
            "max_height" => cfg.max_height = Some(parse_pixels(key, value, line_number)?),
            "timeout_secs" => cfg.timeout_secs = Some(parse_seconds(key, value, line_number)?),
            "render_timeout_secs" => {
                cfg.render_timeout_secs = Some(parse_seconds(key, value, line_number)?);
            }
            "verbose" => cfg.verbose = Some(parse_flag(key, value, line_number)?),
            "render" => cfg.render = Some(parse_flag(key, value, line_number)?),
            "capture" => cfg.capture = Some(parse_flag(key, value, line_number)?),
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn parse_pixels(key: &str, value: &str, line_number: usize) -> Result<u32> {
    let parsed = parse_integer_u64(value)
        .with_context(|| format!("Invalid `{key}` value on line {line_number}"))?;
    u32::try_from(parsed)
        .map_err(|_| anyhow::anyhow!("`{key}` out of range on line {line_number}"))
}

fn parse_seconds(key: &str, value: &str, line_number: usize) -> Result<u64> {
    parse_integer_u64(value).with_context(|| format!("Invalid `{key}` value on line {line_number}"))
}

fn parse_flag(key: &str, value: &str, line_number: usize) -> Result<bool> {
    parse_boolean(value).with_context(|| format!("Invalid `{key}` value on line {line_number}"))
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
