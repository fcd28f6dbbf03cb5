// ABOUTME: Image synchronization: the reconciliation worker and its signalling.
// ABOUTME: Exposes the worker, its control handle, pass reports, and per-pass planning types.

mod error;
mod plan;
mod signal;
mod state;
mod worker;

#[cfg(test)]
mod fakes;

pub use error::{SyncError, SyncErrorKind};
pub use plan::{AvailabilityMap, Candidate, WorkItem, needed_tags};
pub use signal::{SyncHandle, WakeOutcome};
pub use state::{WorkerState, WorkerStatus};
pub use worker::{ImageSyncWorker, PassReport, Transfer};

/// Worker-side signals paired with a handle, for tests outside this module.
#[cfg(test)]
pub(crate) fn test_handle() -> (signal::Signals, SyncHandle) {
    let (handle, signals) = signal::channel();
    (signals, handle)
}
