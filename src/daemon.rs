// ABOUTME: Daemon bootstrap and supervision: config, runtime, worker, watcher, resync timer.
// ABOUTME: Reloads config on file changes and shuts the worker down on SIGINT/SIGTERM.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::signal::unix::{SignalKind, signal};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::config::{self, ConfigWatcher, SharedConfig, SyncConfig};
use crate::error::{Error, Result};
use crate::registry::OciTagLister;
use crate::runtime::{BollardRuntime, RuntimeError, RuntimeInfoOps};
use crate::sync::{ImageSyncWorker, PassReport, SyncHandle, WakeOutcome};

/// Create the home directory if needed, then read (or create) and validate
/// its config file.
///
/// Returns the config path, the config, and whether the file was created.
pub fn load_config(home: &Path) -> Result<(PathBuf, SyncConfig, bool)> {
    std::fs::create_dir_all(home).map_err(|source| Error::HomeDir {
        path: home.to_path_buf(),
        source,
    })?;

    let path = config::config_path(home);
    let (config, created) = SyncConfig::create_or_read(&path)?;
    config.validate()?;
    Ok((path, config, created))
}

/// A configured daemon that has not started its worker yet.
#[derive(Debug)]
pub struct System {
    config_path: PathBuf,
    shared: SharedConfig,
    runtime: BollardRuntime,
}

impl System {
    /// Load config from `home` and connect to the container daemon.
    pub async fn bootstrap(home: &Path) -> Result<Self> {
        let (config_path, config, created) = load_config(home)?;
        if created {
            tracing::info!(path = %config_path.display(), "created default config");
        }

        let runtime = BollardRuntime::connect(&config.docker_config)?;
        runtime
            .ping()
            .await
            .map_err(|e| Error::Runtime(RuntimeError::from(e)))?;
        match runtime.info().await {
            Ok(meta) => tracing::info!(
                runtime = %meta.name,
                version = %meta.version,
                os = %meta.os,
                arch = %meta.arch,
                "connected to container daemon"
            ),
            Err(e) => tracing::info!(
                runtime = %runtime.runtime_type(),
                error = %e,
                "connected to container daemon, version unknown"
            ),
        }

        Ok(Self {
            config_path,
            shared: SharedConfig::new(config),
            runtime,
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn shared_config(&self) -> &SharedConfig {
        &self.shared
    }

    /// Run a single pass and return its report.
    pub async fn sync_once(self) -> PassReport {
        let (worker, _handle) = ImageSyncWorker::new(self.shared, self.runtime, OciTagLister::new());
        worker.run_pass().await
    }

    /// Run until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<()> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        let debounce = self.shared.read(|c| c.watch_debounce);
        let watcher = ConfigWatcher::watch(&self.config_path, debounce)?;

        let (worker, handle) =
            ImageSyncWorker::new(self.shared.clone(), self.runtime, OciTagLister::new());
        let worker_task = tokio::spawn(worker.run());

        let shutdown = async move {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM"),
                _ = sigint.recv() => tracing::info!("received SIGINT"),
            }
        };
        supervise(&self.config_path, &self.shared, &handle, watcher, shutdown).await;

        handle.quit();
        if let Err(e) = worker_task.await {
            tracing::error!(error = %e, "worker task failed");
        }
        Ok(())
    }
}

/// Apply config changes and periodic resync wakes until `shutdown` resolves.
///
/// Losing the watcher only stops reloads; resync keeps running.
async fn supervise(
    config_path: &Path,
    shared: &SharedConfig,
    handle: &SyncHandle,
    mut watcher: ConfigWatcher,
    shutdown: impl Future<Output = ()>,
) {
    let mut resync_every = shared.read(|c| c.resync_interval);
    let mut resync = resync_timer(resync_every);
    let mut watching = true;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            changed = watcher.changed(), if watching => match changed {
                Some(()) => {
                    if let Some(every) = reload(config_path, shared, handle) {
                        if every != resync_every {
                            resync_every = every;
                            resync = resync_timer(resync_every);
                        }
                    }
                }
                None => {
                    tracing::warn!("config watcher stopped; reloads disabled");
                    watching = false;
                }
            },
            _ = tick(&mut resync) => {
                tracing::debug!("periodic resync");
                handle.wake();
            }
        }
    }
}

/// Reload the config file and hand it to the worker.
///
/// A file that fails to load or validate leaves the running config in place.
/// Returns the new resync interval on success.
pub fn reload(
    path: &Path,
    shared: &SharedConfig,
    handle: &SyncHandle,
) -> Option<Option<Duration>> {
    // Parse outside the lock.
    let config = match SyncConfig::load(path).and_then(|c| c.validate().map(|()| c)) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "config reload failed, keeping previous config");
            return None;
        }
    };

    let resync = config.resync_interval;
    shared.replace(config);
    tracing::info!(path = %path.display(), "config reloaded");

    if handle.wake() == WakeOutcome::Terminated {
        tracing::debug!("worker already stopping, reload not applied");
    }
    Some(resync)
}

fn resync_timer(every: Option<Duration>) -> Option<Interval> {
    let every = every.filter(|d| !d.is_zero())?;
    let mut timer = tokio::time::interval_at(Instant::now() + every, every);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    Some(timer)
}

async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending().await,
    }
}
