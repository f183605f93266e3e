//! Reporter trait for dependency injection
//!
//! This trait allows core logic to report progress and status without
//! being coupled to a specific terminal implementation.

use cask_schema::{Token, Version};

pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Installing").
    fn section(&self, title: &str);

    /// Updates the progress of a download.
    fn downloading(&self, token: &Token, version: &Version, current: u64, total: Option<u64>);

    /// Updates the state of a cask to 'installing'.
    fn installing(&self, token: &Token, version: &Version);

    /// Updates the state of a cask to 'removing'.
    fn removing(&self, token: &Token, version: &Version);

    /// Marks a cask operation as successfully completed.
    fn done(&self, token: &Token, version: &Version, detail: &str, size: Option<u64>);

    /// Marks a cask operation as failed with a specific reason.
    fn failed(&self, token: &Token, version: &Version, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Display a final summary of multiple operations.
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn downloading(&self, token: &Token, version: &Version, current: u64, total: Option<u64>) {
        (**self).downloading(token, version, current, total);
    }
    fn installing(&self, token: &Token, version: &Version) {
        (**self).installing(token, version);
    }
    fn removing(&self, token: &Token, version: &Version) {
        (**self).removing(token, version);
    }
    fn done(&self, token: &Token, version: &Version, detail: &str, size: Option<u64>) {
        (**self).done(token, version, detail, size);
    }
    fn failed(&self, token: &Token, version: &Version, reason: &str) {
        (**self).failed(token, version, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        (**self).summary(count, action, elapsed_secs);
    }
}

/// A no-op reporter for silent operations (e.g., verification, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn downloading(&self, _: &Token, _: &Version, _: u64, _: Option<u64>) {}
    fn installing(&self, _: &Token, _: &Version) {}
    fn removing(&self, _: &Token, _: &Version) {}
    fn done(&self, _: &Token, _: &Version, _: &str, _: Option<u64>) {}
    fn failed(&self, _: &Token, _: &Version, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, _: usize, _: &str, _: f64) {}
}
