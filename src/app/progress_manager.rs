//! Progress reporting for a run: stdout lines, optional bar, and per-item warnings.

use indicatif::{ProgressBar, ProgressStyle};
use imgharvest_core::{ImageOutcome, OutcomeKind, RunObserver};
use tracing::warn;

/// Reports pipeline progress to the terminal.
///
/// Lines go to stdout unless JSON output was requested. The bar, when
/// enabled, lives on stderr and every line is printed through it so the two
/// never interleave.
pub(crate) struct ProgressReporter {
    bar: Option<ProgressBar>,
    verbose: bool,
    print_lines: bool,
}

impl ProgressReporter {
    pub(crate) fn new(use_bar: bool, verbose: bool, json: bool) -> Self {
        let bar = use_bar.then(|| {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template("{bar:30} {pos}/{len} {wide_msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        });
        Self {
            bar,
            verbose,
            print_lines: !json,
        }
    }

    fn println(&self, line: &str) {
        if !self.print_lines {
            return;
        }
        match &self.bar {
            Some(bar) => bar.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }

    fn warn_outcome(outcome: &ImageOutcome) {
        match outcome.kind() {
            OutcomeKind::Failed => warn!(
                url = %outcome.url(),
                error = outcome.error().unwrap_or("unknown error"),
                "image failed"
            ),
            OutcomeKind::Filtered => match outcome.dimensions() {
                Some(dimensions) => {
                    warn!(url = %outcome.url(), %dimensions, "image filtered by size bounds");
                }
                None => warn!(
                    url = %outcome.url(),
                    "image filtered: dimensions could not be determined"
                ),
            },
            OutcomeKind::Succeeded => {}
        }
    }

    /// Clears the bar after a completed run.
    pub(crate) fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// Leaves the bar where it stopped after an aborted run.
    pub(crate) fn abandon(&self) {
        if let Some(bar) = &self.bar {
            bar.abandon();
        }
    }
}

impl RunObserver for ProgressReporter {
    fn on_references(&mut self, total: usize) {
        if let Some(bar) = &self.bar {
            bar.set_length(u64::try_from(total).unwrap_or(u64::MAX));
        }
    }

    fn on_outcome(&mut self, index: usize, total: usize, outcome: &ImageOutcome) {
        self.println(&progress_line(index, total, outcome));
        if self.verbose {
            self.println(&detail_line(outcome));
        }

        match &self.bar {
            Some(bar) => {
                bar.suspend(|| Self::warn_outcome(outcome));
                bar.set_message(outcome.url().to_string());
                bar.inc(1);
            }
            None => Self::warn_outcome(outcome),
        }
    }
}

pub(crate) fn progress_line(index: usize, total: usize, outcome: &ImageOutcome) -> String {
    format!("[{index}/{total}] {}", outcome.url())
}

pub(crate) fn detail_line(outcome: &ImageOutcome) -> String {
    let dimensions = outcome
        .dimensions()
        .map_or_else(|| "unknown size".to_string(), |d| d.to_string());
    match outcome.kind() {
        OutcomeKind::Succeeded => format!(
            "    saved {} ({dimensions})",
            outcome
                .saved_path()
                .map_or_else(String::new, |p| p.display().to_string())
        ),
        OutcomeKind::Failed => format!("    failed: {}", outcome.error().unwrap_or("unknown error")),
        OutcomeKind::Filtered => format!("    filtered ({dimensions})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgharvest_core::ImageDimensions;
    use std::path::PathBuf;

    #[test]
    fn test_progress_line_format() {
        let outcome = ImageOutcome::filtered("https://example.com/a.png", None);
        assert_eq!(
            progress_line(2, 5, &outcome),
            "[2/5] https://example.com/a.png"
        );
    }

    #[test]
    fn test_detail_line_per_kind() {
        let saved = ImageOutcome::succeeded(
            "u",
            PathBuf::from("out/a.png"),
            Some(ImageDimensions {
                width: 3,
                height: 2,
            }),
        );
        assert_eq!(detail_line(&saved), "    saved out/a.png (3x2)");

        let failed = ImageOutcome::failed("u", "HTTP 404 downloading u", None);
        assert_eq!(detail_line(&failed), "    failed: HTTP 404 downloading u");

        let filtered = ImageOutcome::filtered("u", None);
        assert_eq!(detail_line(&filtered), "    filtered (unknown size)");
    }

    #[test]
    fn test_reporter_without_bar_accepts_outcomes() {
        let mut reporter = ProgressReporter::new(false, true, true);
        reporter.on_references(1);
        reporter.on_outcome(1, 1, &ImageOutcome::filtered("u", None));
        reporter.finish();
        assert!(reporter.bar.is_none());
    }

    #[test]
    fn test_reporter_with_bar_tracks_length_and_position() {
        let mut reporter = ProgressReporter::new(true, false, true);
        reporter.on_references(3);
        reporter.on_outcome(1, 3, &ImageOutcome::failed("u", "boom", None));
        let bar = reporter.bar.as_ref().expect("bar enabled");
        assert_eq!(bar.length(), Some(3));
        assert_eq!(bar.position(), 1);
        reporter.abandon();
    }
}
