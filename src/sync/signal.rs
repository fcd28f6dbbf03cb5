// ABOUTME: Wake and quit signalling between the daemon and the reconciliation worker.
// ABOUTME: Wakes coalesce into a single pending slot; quit is sticky and idempotent.

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};

use super::state::{WorkerState, WorkerStatus};

/// What happened to a wake request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeOutcome {
    /// A new pass is queued.
    Queued,
    /// A pass was already queued; this request folds into it.
    Coalesced,
    /// The worker has stopped or is stopping.
    Terminated,
}

/// Cloneable control surface for a running worker.
#[derive(Debug, Clone)]
pub struct SyncHandle {
    wake: mpsc::Sender<()>,
    quit: Arc<watch::Sender<bool>>,
    status: watch::Receiver<WorkerStatus>,
}

impl SyncHandle {
    /// Request a recheck. Never blocks.
    pub fn wake(&self) -> WakeOutcome {
        if *self.quit.borrow() {
            return WakeOutcome::Terminated;
        }
        match self.wake.try_send(()) {
            Ok(()) => WakeOutcome::Queued,
            Err(TrySendError::Full(())) => WakeOutcome::Coalesced,
            Err(TrySendError::Closed(())) => WakeOutcome::Terminated,
        }
    }

    /// Ask the worker to stop at its next checkpoint.
    ///
    /// Returns `true` only for the call that actually initiated shutdown.
    pub fn quit(&self) -> bool {
        self.quit.send_if_modified(|requested| {
            if *requested {
                false
            } else {
                *requested = true;
                true
            }
        })
    }

    pub fn is_quitting(&self) -> bool {
        *self.quit.borrow()
    }

    pub fn status(&self) -> WorkerStatus {
        *self.status.borrow()
    }

    /// Receiver for status changes, e.g. to `wait_for` a given state.
    ///
    /// Drop any `watch::Ref` it hands out promptly: a held borrow blocks the
    /// worker's next status update and stalls it.
    pub fn subscribe(&self) -> watch::Receiver<WorkerStatus> {
        self.status.clone()
    }
}

/// Why the worker left `Sleeping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wakeup {
    Wake,
    Quit,
}

/// Worker-side ends of the channels.
#[derive(Debug)]
pub(crate) struct Signals {
    wake: mpsc::Receiver<()>,
    quit: watch::Receiver<bool>,
    status: watch::Sender<WorkerStatus>,
}

pub(crate) fn channel() -> (SyncHandle, Signals) {
    let (wake_tx, wake_rx) = mpsc::channel(1);
    let (quit_tx, quit_rx) = watch::channel(false);
    let (status_tx, status_rx) = watch::channel(WorkerStatus::default());

    let handle = SyncHandle {
        wake: wake_tx,
        quit: Arc::new(quit_tx),
        status: status_rx,
    };
    let signals = Signals {
        wake: wake_rx,
        quit: quit_rx,
        status: status_tx,
    };
    (handle, signals)
}

impl Signals {
    pub(crate) fn quit_requested(&self) -> bool {
        *self.quit.borrow()
    }

    /// Block until woken or told to quit. Quit wins if both are pending.
    ///
    /// Once every handle is gone nobody can wake the worker again, so that
    /// counts as quit.
    pub(crate) async fn sleep(&mut self) -> Wakeup {
        tokio::select! {
            biased;
            _ = self.quit.wait_for(|requested| *requested) => Wakeup::Quit,
            msg = self.wake.recv() => match msg {
                Some(()) => Wakeup::Wake,
                None => Wakeup::Quit,
            },
        }
    }

    /// Consume any wake that arrived during the last pass.
    pub(crate) fn drain_wakes(&mut self) -> bool {
        let mut pending = false;
        while self.wake.try_recv().is_ok() {
            pending = true;
        }
        pending
    }

    pub(crate) fn set_state(&self, state: WorkerState) {
        self.status.send_if_modified(|status| {
            if status.state == state {
                false
            } else {
                status.state = state;
                true
            }
        });
    }

    pub(crate) fn pass_completed(&self) {
        self.status.send_modify(|status| status.passes_completed += 1);
    }
}
