// ABOUTME: The reconciliation worker: diff local tags, map remote sources, transfer what's missing.
// ABOUTME: Runs one pass at a time, sleeping between passes until woken or told to quit.

use std::collections::BTreeSet;

use nonempty::NonEmpty;

use super::error::SyncError;
use super::plan::{Candidate, WorkItem, needed_tags};
use super::signal::{self, Signals, SyncHandle, Wakeup};
use super::state::WorkerState;
use crate::config::{ConfigSnapshot, RemoteRepository, SharedConfig};
use crate::diagnostics::Diagnostics;
use crate::registry::{RegistryError, TagLister};
use crate::runtime::ImageOps;
use crate::types::ImageRef;

/// One image:tag that reached the local repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub image: String,
    pub tag: String,
    /// URL of the repository the tag was pulled from.
    pub source: String,
    /// Name the tag was pushed under.
    pub destination: String,
}

/// Outcome of one pass.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Needed tags summed over all targets.
    pub needed: usize,
    pub transfers: Vec<Transfer>,
    pub diagnostics: Diagnostics,
    /// Quit was observed before the pass finished.
    pub interrupted: bool,
}

impl PassReport {
    /// Needed tags that no source could supply this pass.
    pub fn unsatisfied(&self) -> usize {
        self.needed.saturating_sub(self.transfers.len())
    }
}

/// Keeps the local repository in sync with the configured targets.
///
/// All network calls are made one at a time. Quit is checked between
/// targets, between remote probes, between tags, and while sleeping; a
/// call already in flight is allowed to finish.
pub struct ImageSyncWorker<R, L> {
    config: SharedConfig,
    runtime: R,
    lister: L,
    signals: Signals,
}

impl<R, L> std::fmt::Debug for ImageSyncWorker<R, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSyncWorker")
            .field("signals", &self.signals)
            .finish_non_exhaustive()
    }
}

impl<R: ImageOps, L: TagLister> ImageSyncWorker<R, L> {
    pub fn new(config: SharedConfig, runtime: R, lister: L) -> (Self, SyncHandle) {
        let (handle, signals) = signal::channel();
        let worker = Self {
            config,
            runtime,
            lister,
            signals,
        };
        (worker, handle)
    }

    /// Run passes until quit. The first pass starts immediately.
    pub async fn run(mut self) {
        tracing::info!("image sync worker started");
        let mut recheck = true;

        loop {
            if self.signals.quit_requested() {
                break;
            }

            if !recheck {
                self.signals.set_state(WorkerState::Sleeping);
                tracing::debug!("worker sleeping");
                match self.signals.sleep().await {
                    Wakeup::Quit => break,
                    Wakeup::Wake => tracing::debug!("worker woken, rechecking"),
                }
            }

            let report = self.run_pass().await;
            if report.interrupted {
                break;
            }

            // A wake that landed mid-pass buys exactly one more pass.
            recheck = self.signals.drain_wakes();
        }

        self.signals.set_state(WorkerState::Terminated);
        tracing::info!("image sync worker exiting");
    }

    /// Run a single diff, map and transfer pass.
    pub async fn run_pass(&self) -> PassReport {
        let mut report = PassReport::default();
        self.signals.set_state(WorkerState::Checking);

        // Copy out under the lock; no guard outlives this line.
        let snapshot = self.config.snapshot();

        if snapshot.remotes.is_empty() {
            tracing::debug!("no remote repositories configured, nothing to check");
            self.finish_pass(&report);
            return report;
        }

        let Some(mut items) = self.check(&snapshot, &mut report).await else {
            report.interrupted = true;
            return report;
        };

        if items.is_empty() {
            tracing::debug!("all target images up to date");
            self.finish_pass(&report);
            return report;
        }

        if !self.map_sources(&snapshot.remotes, &mut items, &mut report).await {
            report.interrupted = true;
            return report;
        }

        self.signals.set_state(WorkerState::Transferring);
        if !self.transfer(&items, &mut report).await {
            report.interrupted = true;
            return report;
        }

        self.finish_pass(&report);
        report
    }

    fn finish_pass(&self, report: &PassReport) {
        self.signals.pass_completed();
        tracing::info!(
            needed = report.needed,
            transferred = report.transfers.len(),
            failures = report.diagnostics.failures().len(),
            "pass complete"
        );
    }

    /// Diff every target against the local repository. `None` on quit.
    async fn check(
        &self,
        snapshot: &ConfigSnapshot,
        report: &mut PassReport,
    ) -> Option<Vec<WorkItem>> {
        let mut items = Vec::new();

        for target in &snapshot.targets {
            if self.signals.quit_requested() {
                return None;
            }

            let reference = match ImageRef::qualify(&target.image) {
                Ok(r) => r,
                Err(source) => {
                    report.diagnostics.record(SyncError::InvalidImage {
                        image: target.image.clone(),
                        source,
                    });
                    continue;
                }
            };

            let present = match self.lister.list_tags(&snapshot.local, &reference).await {
                Ok(tags) => tags,
                Err(RegistryError::NotFound(_)) => {
                    tracing::debug!(image = %reference, "image not yet in local repository");
                    Vec::new()
                }
                Err(source) => {
                    report.diagnostics.record(SyncError::LocalRepository {
                        repository: snapshot.local.url.clone(),
                        image: reference.to_string(),
                        source,
                    });
                    continue;
                }
            };

            let needed: BTreeSet<String> = needed_tags(&target.versions, &present);
            if needed.is_empty() {
                tracing::debug!(image = %reference, "up to date");
                continue;
            }

            tracing::info!(
                image = %reference,
                needed = ?needed,
                "image is missing tags"
            );
            report.needed += needed.len();
            items.push(WorkItem::new(target.clone(), reference, needed));
        }

        Some(items)
    }

    /// Probe each remote, in declared order, for the needed tags.
    ///
    /// A remote that cannot be reached is skipped for the rest of the pass.
    /// Returns `false` on quit.
    async fn map_sources(
        &self,
        remotes: &[RemoteRepository],
        items: &mut [WorkItem],
        report: &mut PassReport,
    ) -> bool {
        for remote in remotes {
            for item in items.iter_mut() {
                if self.signals.quit_requested() {
                    return false;
                }

                match self.lister.list_tags(remote, &item.reference).await {
                    Ok(tags) => {
                        let matched = item.record_remote_tags(remote, &tags);
                        tracing::debug!(
                            image = %item.reference,
                            source = %remote.url,
                            matched,
                            "probed remote repository"
                        );
                    }
                    Err(RegistryError::NotFound(_)) => {
                        tracing::debug!(
                            image = %item.reference,
                            source = %remote.url,
                            "image not in remote repository"
                        );
                    }
                    Err(source) => {
                        let unreachable = matches!(
                            source,
                            RegistryError::Connection { .. } | RegistryError::InvalidEndpoint(_)
                        );
                        report.diagnostics.record(SyncError::RemoteRepository {
                            repository: remote.url.clone(),
                            image: item.reference.to_string(),
                            source,
                        });
                        if unreachable {
                            break;
                        }
                    }
                }
            }
        }
        true
    }

    /// Transfer every needed tag that has a candidate. Returns `false` on quit.
    async fn transfer(&self, items: &[WorkItem], report: &mut PassReport) -> bool {
        for item in items {
            for tag in &item.needed {
                if self.signals.quit_requested() {
                    return false;
                }

                let Some(candidates) = item.availability.candidates(tag) else {
                    tracing::info!(
                        image = %item.reference,
                        tag = %tag,
                        "no remote repository has this tag"
                    );
                    continue;
                };

                if let Some(transfer) = self.transfer_tag(item, candidates, report).await {
                    report.transfers.push(transfer);
                }
            }
        }
        true
    }

    /// Try candidates in order until one pull succeeds, then tag and push.
    ///
    /// Only a failure tied to the candidate itself moves on to the next one;
    /// once a pull succeeds the tag gets no further attempts this pass.
    async fn transfer_tag(
        &self,
        item: &WorkItem,
        candidates: &NonEmpty<Candidate>,
        report: &mut PassReport,
    ) -> Option<Transfer> {
        let image = item.reference.to_string();

        for candidate in candidates.iter() {
            let tag = candidate.tag.as_str();
            let source = &candidate.source;

            let pulled = match source.qualify(&item.reference) {
                Ok(r) => r,
                Err(err) => {
                    report.diagnostics.record(SyncError::Naming {
                        image: image.clone(),
                        prefix: source.pull_prefix.clone(),
                        source: err,
                    });
                    continue;
                }
            };

            tracing::info!(image = %image, tag, source = %source.url, reference = %pulled, "pulling");
            if let Err(err) = self.runtime.pull_image(&pulled, tag, &source.access()).await {
                report.diagnostics.record(SyncError::Pull {
                    image: image.clone(),
                    tag: tag.to_string(),
                    origin: source.url.clone(),
                    source: err,
                });
                continue;
            }

            // Re-read so a reload since the pass began is honoured for the push.
            let local = self.config.local_repository();
            let destination = match local.qualify(&item.reference) {
                Ok(d) => d,
                Err(err) => {
                    report.diagnostics.record(SyncError::Naming {
                        image: image.clone(),
                        prefix: local.pull_prefix.clone(),
                        source: err,
                    });
                    return None;
                }
            };

            if destination != pulled {
                tracing::debug!(
                    image = %image,
                    tag,
                    source = %source.url,
                    destination = %destination,
                    "tagging"
                );
                if let Err(err) = self.runtime.tag_image(&pulled, &destination, tag).await {
                    report.diagnostics.record(SyncError::Tag {
                        image: image.clone(),
                        tag: tag.to_string(),
                        destination: destination.to_string(),
                        source: err,
                    });
                    return None;
                }
            }

            tracing::info!(
                image = %image,
                tag,
                source = %source.url,
                destination = %destination,
                "pushing"
            );
            if let Err(err) = self.runtime.push_image(&destination, tag, &local.access()).await {
                report.diagnostics.record(SyncError::Push {
                    image: image.clone(),
                    tag: tag.to_string(),
                    destination: destination.to_string(),
                    source: err,
                });
                return None;
            }

            tracing::info!(
                image = %image,
                tag,
                source = %source.url,
                destination = %destination,
                "transferred"
            );
            return Some(Transfer {
                image,
                tag: tag.to_string(),
                source: source.url.clone(),
                destination: destination.to_string(),
            });
        }

        None
    }
}
