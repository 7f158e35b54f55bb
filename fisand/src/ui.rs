// fisand/src/ui.rs
//! Spinners and progress reporting for the terminal.

use std::sync::Mutex;
use std::time::Duration;

use colored::Colorize;
use fisand_common::error::FisandError;
use fisand_common::model::FetchTarget;
use fisand_core::{FetchObserver, Materialization};
use indicatif::{ProgressBar, ProgressStyle};

/// Creates and configures a default spinner ProgressBar.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Shows one spinner per module fetch.
///
/// Fetches run one after another, so a single slot is enough.
#[derive(Default)]
pub struct SpinnerObserver {
    current: Mutex<Option<ProgressBar>>,
}

impl SpinnerObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn take(&self) -> Option<ProgressBar> {
        self.current.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl FetchObserver for SpinnerObserver {
    fn fetch_started(&self, target: &FetchTarget) {
        let spinner = create_spinner(&format!("Downloading {target}..."));
        if let Ok(mut slot) = self.current.lock() {
            if let Some(previous) = slot.replace(spinner) {
                previous.finish_and_clear();
            }
        }
    }

    fn fetch_finished(&self, target: &FetchTarget, report: &Materialization) {
        if let Some(spinner) = self.take() {
            let message = if report.has_failures() {
                format!(
                    "{} Downloaded {} ({} failed)",
                    "!".yellow().bold(),
                    target,
                    report.failed_count()
                )
            } else {
                format!("{} Downloaded {}", "✓".green().bold(), target)
            };
            spinner.finish_with_message(message);
        }
    }

    fn fetch_failed(&self, target: &FetchTarget, error: &FisandError) {
        if let Some(spinner) = self.take() {
            spinner.abandon_with_message(format!(
                "{} Failed to download {}: {}",
                "✗".red().bold(),
                target,
                error
            ));
        }
    }
}
