// ABOUTME: Diagnostics accumulator for non-fatal failures during a reconciliation pass.
// ABOUTME: Collects failures that shouldn't stop the worker but should be shown to users.

use crate::sync::{SyncError, SyncErrorKind};

/// Collects non-fatal failures during a pass.
#[derive(Debug, Default)]
pub struct Diagnostics {
    failures: Vec<SyncError>,
}

impl Diagnostics {
    /// Record a failure, auto-logging it via tracing.
    pub fn record(&mut self, failure: SyncError) {
        tracing::warn!(image = %failure.image(), kind = ?failure.kind(), "{}", failure);
        self.failures.push(failure);
    }

    /// Get all collected failures.
    pub fn failures(&self) -> &[SyncError] {
        &self.failures
    }

    /// Check if any failures were collected.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Number of failures of one kind.
    pub fn count(&self, kind: SyncErrorKind) -> usize {
        self.failures.iter().filter(|f| f.kind() == kind).count()
    }
}
