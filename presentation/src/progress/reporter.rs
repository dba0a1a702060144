//! Progress reporting while a request is in flight

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Creates spinners for in-flight requests, or nothing when disabled.
#[derive(Debug, Clone, Copy)]
pub struct ProgressReporter {
    enabled: bool,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Start a spinner labelled with the deployment being called.
    pub fn start(&self, model_id: &str) -> Spinner {
        if !self.enabled {
            return Spinner { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::spinner_style());
        bar.set_prefix(model_id.to_string());
        bar.set_message("waiting for reply...");
        bar.enable_steady_tick(Duration::from_millis(100));
        Spinner { bar: Some(bar) }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

/// A running spinner. Cleared when dropped.
pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl Spinner {
    pub fn succeed(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    pub fn fail(&self, reason: &str) {
        if let Some(bar) = &self.bar {
            bar.abandon_with_message(format!("{} {}", "x".red(), reason));
        }
    }

    pub fn is_active(&self) -> bool {
        self.bar.as_ref().is_some_and(|bar| !bar.is_finished())
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(bar) = &self.bar
            && !bar.is_finished()
        {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_reporter_has_no_spinner() {
        let spinner = ProgressReporter::new(false).start("local");
        assert!(!spinner.is_active());
        spinner.succeed();
        spinner.fail("ignored");
    }

    #[test]
    fn test_spinner_finishes() {
        let spinner = ProgressReporter::new(true).start("local");
        assert!(spinner.is_active());
        spinner.succeed();
        assert!(!spinner.is_active());
    }
}
