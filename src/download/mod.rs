//! Download coordination
//!
//! The orchestration loop hands each chosen file set to a
//! [`DownloadCoordinator`] and moves on; transfers run in the background.
//! [`DownloadManager`] is the tokio-based implementation:
//! - [`transfer`] - Pluggable file transfer backends
//! - [`log`] - Buffered status lines, written out on flush
//!
//! Once the loop reports that every download has been submitted and no
//! transfer is left in flight, the manager is *settled* and
//! [`DownloadManager::settled`] resolves.

mod log;
mod transfer;

pub use log::{DownloadLog, LogEntry, LogKind};
pub use transfer::{HttpTransfer, Transfer};

use crate::types::{Event, FileDescriptor};
use crate::utils::{get_unique_path_with, local_destination};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Receives file sets chosen by the orchestration loop
///
/// None of these calls may block on transfer progress.
pub trait DownloadCoordinator: Send + Sync {
    /// Queue and start transfers for one owner's files
    fn start_downloads(&self, files: Vec<FileDescriptor>);

    /// Write out buffered download log lines
    fn flush_log(&self);

    /// Record that no further downloads will be queued
    fn notify_all_submitted(&self);
}

/// Transfer counters, reserved destinations and the settle latch
struct Tracker {
    in_flight: AtomicUsize,
    // Local paths handed to transfers that have not finished yet
    reserved: Mutex<HashSet<PathBuf>>,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    all_submitted: AtomicBool,
    settled: tokio::sync::watch::Sender<bool>,
}

/// Tokio-backed download coordinator (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct DownloadManager {
    transfer: Arc<dyn Transfer>,
    destination: Arc<PathBuf>,
    concurrent_limit: Arc<tokio::sync::Semaphore>,
    log: Arc<DownloadLog>,
    tracker: Arc<Tracker>,
    event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl DownloadManager {
    /// Create a manager writing under `destination`, running at most
    /// `max_concurrent` transfers at once
    pub fn new(transfer: Arc<dyn Transfer>, destination: PathBuf, max_concurrent: usize) -> Self {
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);
        let (settled, _rx) = tokio::sync::watch::channel(false);
        Self {
            transfer,
            destination: Arc::new(destination),
            concurrent_limit: Arc::new(tokio::sync::Semaphore::new(max_concurrent.max(1))),
            log: Arc::new(DownloadLog::new()),
            tracker: Arc::new(Tracker {
                in_flight: AtomicUsize::new(0),
                reserved: Mutex::new(HashSet::new()),
                succeeded: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
                all_submitted: AtomicBool::new(false),
                settled,
            }),
            event_tx,
        }
    }

    /// Subscribe to download events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Buffered status log
    pub fn log(&self) -> &DownloadLog {
        &self.log
    }

    /// Transfers currently queued or running
    pub fn in_flight(&self) -> usize {
        self.tracker.in_flight.load(Ordering::SeqCst)
    }

    /// `(succeeded, failed)` transfer counts so far
    pub fn summary(&self) -> (usize, usize) {
        (
            self.tracker.succeeded.load(Ordering::SeqCst),
            self.tracker.failed.load(Ordering::SeqCst),
        )
    }

    /// Whether all downloads were submitted and none is in flight
    pub fn is_settled(&self) -> bool {
        *self.tracker.settled.borrow()
    }

    /// Wait until all downloads were submitted and none is in flight
    pub async fn settled(&self) {
        let mut rx = self.tracker.settled.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let _ = rx.wait_for(|settled| *settled).await;
    }

    fn record_failure(&self, file: &FileDescriptor, error: &crate::Error) {
        self.tracker.failed.fetch_add(1, Ordering::SeqCst);
        self.log.record(
            LogKind::Failed,
            format!("Failed to download {}: {}", file.path, error),
        );
        self.event_tx
            .send(Event::DownloadFailed {
                file: file.path.clone(),
                error: error.to_string(),
            })
            .ok();
    }

    fn reserved(&self) -> std::sync::MutexGuard<'_, HashSet<PathBuf>> {
        self.tracker
            .reserved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pick a free local path for `file` and hold it until its transfer finishes
    ///
    /// A path is free when nothing exists there on disk and no running
    /// transfer was given it.
    fn reserve_destination(&self, file: &FileDescriptor) -> crate::Result<PathBuf> {
        let wanted = local_destination(&self.destination, file)?;
        let mut reserved = self.reserved();
        let path = get_unique_path_with(&wanted, |candidate| {
            reserved.contains(candidate) || candidate.exists()
        })?;
        reserved.insert(path.clone());
        Ok(path)
    }

    fn finish_one(&self, destination: &Path) {
        self.reserved().remove(destination);
        self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.check_settled();
    }

    fn check_settled(&self) {
        if !self.tracker.all_submitted.load(Ordering::SeqCst)
            || self.tracker.in_flight.load(Ordering::SeqCst) != 0
        {
            return;
        }

        let newly_settled = self.tracker.settled.send_if_modified(|settled| {
            if *settled {
                false
            } else {
                *settled = true;
                true
            }
        });

        if newly_settled {
            let (succeeded, failed) = self.summary();
            tracing::info!(succeeded, failed, "All downloads completed");
            self.event_tx
                .send(Event::AllDownloadsSettled { succeeded, failed })
                .ok();
        }
    }

    fn spawn_transfer(&self, file: FileDescriptor, destination: PathBuf) {
        let manager = self.clone();
        tokio::spawn(async move {
            // Semaphore is never closed
            let _permit = manager.concurrent_limit.clone().acquire_owned().await.ok();

            match manager.transfer.fetch(&file, &destination).await {
                Ok(bytes) => {
                    manager.tracker.succeeded.fetch_add(1, Ordering::SeqCst);
                    manager.log.record(
                        LogKind::Finished,
                        format!("Downloaded {} ({} bytes)", destination.display(), bytes),
                    );
                    manager
                        .event_tx
                        .send(Event::DownloadComplete {
                            file: file.path.clone(),
                            path: destination.clone(),
                            bytes,
                        })
                        .ok();
                }
                Err(e) => {
                    tracing::debug!(file = %file.path, error = %e, "transfer failed");
                    manager.record_failure(&file, &e);
                }
            }

            manager.finish_one(&destination);
        });
    }
}

impl DownloadCoordinator for DownloadManager {
    fn start_downloads(&self, files: Vec<FileDescriptor>) {
        let Some(owner) = files.first().map(|f| f.owner.clone()) else {
            return;
        };
        tracing::info!(owner = %owner, files = files.len(), "Starting downloads");

        for file in files {
            let destination = match self.reserve_destination(&file) {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(file = %file.path, error = %e, "cannot map file to a local path");
                    self.record_failure(&file, &e);
                    continue;
                }
            };

            self.tracker.in_flight.fetch_add(1, Ordering::SeqCst);
            self.log.record(
                LogKind::Queued,
                format!("Queued {} from {}", file.path, file.owner),
            );
            self.event_tx
                .send(Event::DownloadQueued {
                    owner: file.owner.clone(),
                    file: file.path.clone(),
                })
                .ok();

            self.spawn_transfer(file, destination);
        }
    }

    fn flush_log(&self) {
        self.log.flush();
    }

    fn notify_all_submitted(&self) {
        self.tracker.all_submitted.store(true, Ordering::SeqCst);
        tracing::debug!(in_flight = self.in_flight(), "all downloads submitted");
        self.check_settled();
    }
}
