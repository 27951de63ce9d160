// Snapshot store: current channel list and aggregate stats for one dashboard session.
// Every write swaps whole values under the lock, so readers see either the old or the new state.

use crate::models::{AggregateStats, ChannelId, ChannelRecord};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Immutable view of the store at one instant. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub channels: Arc<Vec<ChannelRecord>>,
    /// `None` until the first successful stats fetch.
    pub stats: Option<Arc<AggregateStats>>,
}

/// Result of a store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// `patch_one` found no record with that id; nothing changed.
    NotFound,
    /// The store was torn down; late results are dropped.
    Closed,
}

#[derive(Default)]
struct Inner {
    channels: Arc<Vec<ChannelRecord>>,
    stats: Option<Arc<AggregateStats>>,
    closed: bool,
}

#[derive(Default)]
pub struct SnapshotStore {
    inner: RwLock<Inner>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read().await;
        Snapshot {
            channels: inner.channels.clone(),
            stats: inner.stats.clone(),
        }
    }

    pub async fn channel_count(&self) -> usize {
        self.inner.read().await.channels.len()
    }

    pub async fn get(&self, id: &ChannelId) -> Option<ChannelRecord> {
        let inner = self.inner.read().await;
        inner.channels.iter().find(|c| &c.id == id).cloned()
    }

    /// Id of the snapshot record whose rendered id equals `key`, as typed by the backend.
    pub async fn resolve_id(&self, key: &str) -> Option<ChannelId> {
        let inner = self.inner.read().await;
        inner
            .channels
            .iter()
            .find(|c| c.id.to_string() == key)
            .map(|c| c.id.clone())
    }

    /// Swaps the entire channel set. Records absent from `channels` are dropped.
    /// Duplicate ids keep their first occurrence.
    pub async fn replace_all(&self, channels: Vec<ChannelRecord>) -> WriteOutcome {
        let channels = dedupe_by_id(channels);
        let mut inner = self.inner.write().await;
        if inner.closed {
            debug!(operation = "replace_all", "store closed; dropping channel list");
            return WriteOutcome::Closed;
        }
        inner.channels = Arc::new(channels);
        WriteOutcome::Applied
    }

    /// Swaps the aggregate stats block, independently of the channel list.
    pub async fn replace_stats(&self, stats: AggregateStats) -> WriteOutcome {
        let mut inner = self.inner.write().await;
        if inner.closed {
            debug!(operation = "replace_stats", "store closed; dropping stats");
            return WriteOutcome::Closed;
        }
        inner.stats = Some(Arc::new(stats));
        WriteOutcome::Applied
    }

    /// Replaces the record whose id matches `updated.id`. Never inserts.
    pub async fn patch_one(&self, updated: ChannelRecord) -> WriteOutcome {
        let mut inner = self.inner.write().await;
        if inner.closed {
            debug!(operation = "patch_one", id = %updated.id, "store closed; dropping patch");
            return WriteOutcome::Closed;
        }
        let Some(pos) = inner.channels.iter().position(|c| c.id == updated.id) else {
            return WriteOutcome::NotFound;
        };
        // Copy-on-write: outstanding snapshots keep the pre-patch list.
        Arc::make_mut(&mut inner.channels)[pos] = updated;
        WriteOutcome::Applied
    }

    /// Tears the store down. Contents stay readable; all later writes are no-ops.
    pub async fn close(&self) {
        self.inner.write().await.closed = true;
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.read().await.closed
    }
}

fn dedupe_by_id(channels: Vec<ChannelRecord>) -> Vec<ChannelRecord> {
    let mut seen = HashSet::with_capacity(channels.len());
    let before = channels.len();
    let out: Vec<ChannelRecord> = channels
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .collect();
    if out.len() != before {
        warn!(
            operation = "replace_all",
            dropped = before - out.len(),
            "channel list contained duplicate ids"
        );
    }
    out
}
