//! Terminal progress bar for imports and scans.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use beastvault_import::{ImportProgress, ItemStatus, LogProgress};

/// Pick the progress reporter for the output mode: log lines with
/// `--verbose`, otherwise a bar (hidden with `--quiet`).
pub(crate) fn reporter(quiet: bool, verbose: bool) -> Box<dyn ImportProgress> {
    if verbose {
        Box::new(LogProgress)
    } else {
        Box::new(BarProgress::new(quiet))
    }
}

/// An [`ImportProgress`] that drives a single indicatif bar.
///
/// The bar is created hidden and sized on the first item, so phases that
/// process nothing leave no trace on the terminal.
pub(crate) struct BarProgress {
    bar: ProgressBar,
    quiet: bool,
}

impl BarProgress {
    pub(crate) fn new(quiet: bool) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden());
        bar.set_style(
            ProgressStyle::with_template("  {bar:30.cyan/dim} {pos}/{len} {wide_msg}")
                .expect("static pattern")
                .progress_chars("=> "),
        );
        Self { bar, quiet }
    }
}

impl ImportProgress for BarProgress {
    fn on_phase(&self, message: &str) {
        log::debug!("{}", message);
    }

    fn on_item(&self, current: usize, total: usize, name: &str) {
        if current == 1 && !self.quiet {
            self.bar.set_draw_target(ProgressDrawTarget::stderr());
        }
        self.bar.set_length(total as u64);
        self.bar.set_position(current.saturating_sub(1) as u64);
        self.bar.set_message(name.to_string());
    }

    fn on_result(&self, name: &str, status: &ItemStatus) {
        self.bar.inc(1);
        if let ItemStatus::Error { message } = status {
            self.bar.suspend(|| log::warn!("{}: {}", name, message));
        }
    }

    fn on_complete(&self, message: &str) {
        self.bar.finish_and_clear();
        log::debug!("{}", message);
    }
}
