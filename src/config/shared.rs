// ABOUTME: Lock-guarded configuration shared between the reload path and the worker.
// ABOUTME: Readers copy out what they need and release the lock before any network call.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{RemoteRepository, SyncConfig, TargetImage};

/// The fields one reconciliation pass works from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    pub local: RemoteRepository,
    pub remotes: Vec<RemoteRepository>,
    pub targets: Vec<TargetImage>,
}

/// Configuration shared across tasks.
///
/// Every accessor takes the lock, copies out, and drops the guard before
/// returning. `parking_lot` guards are not `Send`, so a guard held across an
/// `.await` inside a spawned task fails to compile.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<Mutex<SyncConfig>>,
}

impl SharedConfig {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(config)),
        }
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        let config = self.inner.lock();
        ConfigSnapshot {
            local: config.repo.clone(),
            remotes: config.remote_repos.clone(),
            targets: config.images.clone(),
        }
    }

    pub fn local_repository(&self) -> RemoteRepository {
        self.inner.lock().repo.clone()
    }

    pub fn has_remote_repositories(&self) -> bool {
        !self.inner.lock().remote_repos.is_empty()
    }

    /// Swap in a freshly loaded config, returning the previous one.
    pub fn replace(&self, config: SyncConfig) -> SyncConfig {
        std::mem::replace(&mut *self.inner.lock(), config)
    }

    /// Mutate the config in place under the lock.
    pub fn update<T>(&self, f: impl FnOnce(&mut SyncConfig) -> T) -> T {
        f(&mut self.inner.lock())
    }

    /// Run `f` against the config under the lock.
    pub fn read<T>(&self, f: impl FnOnce(&SyncConfig) -> T) -> T {
        f(&self.inner.lock())
    }
}
