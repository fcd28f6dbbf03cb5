// ABOUTME: Worker lifecycle states and the status snapshot published to observers.
// ABOUTME: Sleeping, Checking, Transferring, Terminated plus a completed-pass counter.

use std::fmt;

/// Where the reconciliation loop currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkerState {
    Sleeping,
    /// Initial state: a pass runs as soon as the worker starts.
    #[default]
    Checking,
    Transferring,
    Terminated,
}

impl WorkerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Terminated)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Sleeping => "sleeping",
            WorkerState::Checking => "checking",
            WorkerState::Transferring => "transferring",
            WorkerState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Published on every state change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStatus {
    pub state: WorkerState,
    /// Passes that ran to completion without being interrupted by quit.
    pub passes_completed: u64,
}
