//! Import and scan progress reporting.

use crate::ingest::ItemStatus;

/// Trait for receiving ingestion and scan progress updates.
pub trait ImportProgress {
    /// Called when a phase starts (e.g. "Hashing 120 files").
    fn on_phase(&self, message: &str);

    /// Called before each item is processed.
    fn on_item(&self, current: usize, total: usize, name: &str);

    /// Called with the outcome of each item.
    fn on_result(&self, name: &str, status: &ItemStatus);

    /// Called when the operation is complete.
    fn on_complete(&self, message: &str);
}

/// A no-op progress reporter that discards all updates.
pub struct SilentProgress;

impl ImportProgress for SilentProgress {
    fn on_phase(&self, _message: &str) {}
    fn on_item(&self, _current: usize, _total: usize, _name: &str) {}
    fn on_result(&self, _name: &str, _status: &ItemStatus) {}
    fn on_complete(&self, _message: &str) {}
}

/// A progress reporter that logs to the `log` crate.
pub struct LogProgress;

impl ImportProgress for LogProgress {
    fn on_phase(&self, message: &str) {
        log::info!("{}", message);
    }

    fn on_item(&self, current: usize, total: usize, name: &str) {
        if current.is_multiple_of(100) || current == total {
            log::info!("  [{}/{}] {}", current, total, name);
        }
    }

    fn on_result(&self, name: &str, status: &ItemStatus) {
        if let ItemStatus::Error { message } = status {
            log::warn!("  {}: {}", name, message);
        }
    }

    fn on_complete(&self, message: &str) {
        log::info!("{}", message);
    }
}
