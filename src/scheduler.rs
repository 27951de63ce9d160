// Poll scheduler: immediate full sync on start, then one every interval.
// At most one full sync runs at a time; a tick that finds one in flight is skipped.
// Manual refresh shares that rule. Stopping closes the store so late results are dropped.

use crate::client::{ChannelSource, SyncError};
use crate::models::{ChannelId, ChannelRecord};
use crate::store::{Snapshot, SnapshotStore, WriteOutcome};
use crate::sync::{self, SyncReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{oneshot, watch};
use tokio::time::{Duration, Instant, interval, interval_at};
use tracing::Instrument;

pub struct PollerConfig {
    /// Period between automatic full syncs.
    pub interval: Duration,
    /// How often to log poller counters.
    pub status_log_interval: Duration,
}

/// Observable sync state for the dashboard (spinner, disabled refresh button, stale-data hint).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// True until the first full sync finishes.
    pub loading: bool,
    /// True while a manual refresh is running.
    pub refreshing: bool,
    /// Wall-clock time of the last full sync in which at least one fetch was applied.
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Most recent failure; cleared by a fully successful sync.
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollerStats {
    pub syncs_completed: u64,
    pub fetches_failed: u64,
    pub ticks_skipped: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed(SyncReport),
    /// Another full sync was running; nothing was started.
    AlreadyInFlight,
}

struct Shared<S> {
    source: Arc<S>,
    store: Arc<SnapshotStore>,
    in_flight: AtomicBool,
    status_tx: watch::Sender<SyncStatus>,
    syncs_completed: AtomicU64,
    fetches_failed: AtomicU64,
    ticks_skipped: AtomicU64,
}

/// Clears the in-flight flag on drop, including when the sync future is cancelled.
struct InFlightGuard<S: ChannelSource>(Arc<Shared<S>>);

impl<S: ChannelSource> Drop for InFlightGuard<S> {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

/// Clears `SyncStatus::refreshing` on drop.
struct RefreshingGuard<'a>(&'a watch::Sender<SyncStatus>);

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|s| s.refreshing = false);
    }
}

impl<S: ChannelSource> Shared<S> {
    fn try_begin(self: &Arc<Self>) -> Option<InFlightGuard<S>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(self.clone()))
    }

    async fn run_full_sync(&self) -> SyncReport {
        let report = sync::full_sync(self.source.as_ref(), &self.store).await;
        self.record(&report);
        report
    }

    fn record(&self, report: &SyncReport) {
        self.syncs_completed.fetch_add(1, Ordering::Relaxed);
        let failed = report.errors().count() as u64;
        self.fetches_failed.fetch_add(failed, Ordering::Relaxed);
        let last_error = report
            .errors()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        self.status_tx.send_modify(|s| {
            s.loading = false;
            if report.any_applied() {
                s.last_sync_at = Some(Utc::now());
            }
            if report.is_complete() {
                s.last_error = None;
            } else if !last_error.is_empty() {
                s.last_error = Some(last_error);
            }
        });
    }

    fn stats(&self) -> PollerStats {
        PollerStats {
            syncs_completed: self.syncs_completed.load(Ordering::Relaxed),
            fetches_failed: self.fetches_failed.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Cloneable handle used by the dashboard boundary to read state and forward intents.
pub struct PollerHandle<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for PollerHandle<S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<S: ChannelSource> PollerHandle<S> {
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.shared.store
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.shared.store.snapshot().await
    }

    pub fn status(&self) -> SyncStatus {
        self.shared.status_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.shared.status_tx.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        self.shared.status_tx.borrow().refreshing
    }

    pub fn is_syncing(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> PollerStats {
        self.shared.stats()
    }

    /// Runs a full sync now unless one is already in flight.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_in_flight) = self.shared.try_begin() else {
            tracing::debug!(operation = "refresh", "sync already in flight; refresh ignored");
            return RefreshOutcome::AlreadyInFlight;
        };
        self.shared.status_tx.send_modify(|s| s.refreshing = true);
        let _refreshing = RefreshingGuard(&self.shared.status_tx);
        tracing::info!(operation = "refresh", "manual refresh");
        RefreshOutcome::Completed(self.shared.run_full_sync().await)
    }

    /// Targeted recheck of one channel. Not serialized against full syncs; last write wins.
    pub async fn recheck(
        &self,
        id: &ChannelId,
    ) -> Result<(ChannelRecord, WriteOutcome), SyncError> {
        let result =
            sync::recheck_channel(self.shared.source.as_ref(), &self.shared.store, id).await;
        if let Err(e) = &result {
            self.shared
                .status_tx
                .send_modify(|s| s.last_error = Some(e.to_string()));
        }
        result
    }
}

/// Owner of the background poll loop. Dropping it without `stop` also ends the loop.
pub struct Poller<S> {
    handle: PollerHandle<S>,
    shutdown_tx: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl<S: ChannelSource> Poller<S> {
    pub fn handle(&self) -> PollerHandle<S> {
        self.handle.clone()
    }

    /// Tears down: closes the store, cancels the timer, and waits for the loop to exit.
    /// A sync already in flight finishes in the background but its writes are dropped.
    pub async fn stop(self) {
        self.handle.shared.store.close().await;
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "poll loop ended abnormally");
        }
    }
}

pub fn spawn<S: ChannelSource>(
    source: Arc<S>,
    store: Arc<SnapshotStore>,
    config: PollerConfig,
) -> Poller<S> {
    let (status_tx, _) = watch::channel(SyncStatus {
        loading: true,
        ..Default::default()
    });
    let shared = Arc::new(Shared {
        source,
        store,
        in_flight: AtomicBool::new(false),
        status_tx,
        syncs_completed: AtomicU64::new(0),
        fetches_failed: AtomicU64::new(0),
        ticks_skipped: AtomicU64::new(0),
    });
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let PollerConfig {
        interval: poll_interval,
        status_log_interval,
    } = config;

    let loop_shared = shared.clone();
    let span = tracing::span!(
        tracing::Level::DEBUG,
        "poller",
        interval_secs = poll_interval.as_secs()
    );
    let task = tokio::spawn(
        async move {
            // First tick completes immediately: that is the initial sync.
            let mut tick = interval(poll_interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut status_log_tick =
                interval_at(Instant::now() + status_log_interval, status_log_interval);
            status_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Poller shutting down");
                        break;
                    }
                    _ = tick.tick() => {
                        match loop_shared.try_begin() {
                            Some(guard) => {
                                tokio::spawn(async move {
                                    guard.0.run_full_sync().await;
                                }.in_current_span());
                            }
                            None => {
                                loop_shared.ticks_skipped.fetch_add(1, Ordering::Relaxed);
                                tracing::debug!(
                                    operation = "poll_tick",
                                    "previous sync still in flight; skipping tick"
                                );
                            }
                        }
                    }
                    _ = status_log_tick.tick() => {
                        let stats = loop_shared.stats();
                        let channels = loop_shared.store.channel_count().await;
                        tracing::info!(
                            syncs_completed = stats.syncs_completed,
                            fetches_failed = stats.fetches_failed,
                            ticks_skipped = stats.ticks_skipped,
                            channels,
                            "poller stats"
                        );
                    }
                }
            }
        }
        .instrument(span),
    );

    Poller {
        handle: PollerHandle { shared },
        shutdown_tx,
        task,
    }
}
