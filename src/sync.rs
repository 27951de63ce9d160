// Full sync and targeted recheck: run client calls and fold the results into the store.
// Failures are logged and leave the store untouched; nothing here returns early on error.

use crate::client::{ChannelSource, SyncError};
use crate::models::{ChannelId, ChannelRecord};
use crate::store::{SnapshotStore, WriteOutcome};
use serde::Serialize;
use tracing::{debug, warn};

/// What happened to one half of a full sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum FetchOutcome {
    Applied,
    /// Fetched fine, but the store had been torn down in the meantime.
    Discarded,
    Failed { error: SyncError },
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied)
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            FetchOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }

    fn from_write(outcome: WriteOutcome) -> Self {
        match outcome {
            WriteOutcome::Applied => FetchOutcome::Applied,
            WriteOutcome::NotFound | WriteOutcome::Closed => FetchOutcome::Discarded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub channels: FetchOutcome,
    pub stats: FetchOutcome,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.channels.is_applied() && self.stats.is_applied()
    }

    pub fn any_applied(&self) -> bool {
        self.channels.is_applied() || self.stats.is_applied()
    }

    pub fn errors(&self) -> impl Iterator<Item = &SyncError> {
        self.channels.error().into_iter().chain(self.stats.error())
    }
}

/// Fetches channels and stats concurrently; each result is applied as soon as it arrives.
pub async fn full_sync<S: ChannelSource>(source: &S, store: &SnapshotStore) -> SyncReport {
    let channels = async {
        match source.fetch_channels().await {
            Ok(list) => {
                let n = list.len();
                let outcome = FetchOutcome::from_write(store.replace_all(list).await);
                debug!(operation = "fetch_channels", channels_count = n, ?outcome, "channel list fetched");
                outcome
            }
            Err(e) => {
                warn!(
                    error = %e,
                    operation = "fetch_channels",
                    "channel fetch failed; keeping previous snapshot"
                );
                FetchOutcome::Failed { error: e }
            }
        }
    };
    let stats = async {
        match source.fetch_stats().await {
            Ok(stats) => {
                let outcome = FetchOutcome::from_write(store.replace_stats(stats).await);
                debug!(operation = "fetch_stats", ?outcome, "stats fetched");
                outcome
            }
            Err(e) => {
                warn!(
                    error = %e,
                    operation = "fetch_stats",
                    "stats fetch failed; keeping previous stats"
                );
                FetchOutcome::Failed { error: e }
            }
        }
    };
    let (channels, stats) = tokio::join!(channels, stats);
    SyncReport { channels, stats }
}

/// Re-probes one channel and patches the store with the returned record.
/// The returned `WriteOutcome` is `NotFound` when the id is no longer in the snapshot.
pub async fn recheck_channel<S: ChannelSource>(
    source: &S,
    store: &SnapshotStore,
    id: &ChannelId,
) -> Result<(ChannelRecord, WriteOutcome), SyncError> {
    let mut record = match source.recheck_channel(id).await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, operation = "recheck_channel", id = %id, "recheck failed");
            return Err(e);
        }
    };
    if !record.id.same_as(id) {
        let e = SyncError::Protocol(format!(
            "recheck of channel {} returned channel {}",
            id, record.id
        ));
        warn!(error = %e, operation = "recheck_channel", "recheck returned the wrong record");
        return Err(e);
    }
    // Keep the id typed as requested so the patch lands on the stored record.
    record.id = id.clone();
    let outcome = store.patch_one(record.clone()).await;
    debug!(operation = "recheck_channel", id = %id, status = record.status.as_str(), ?outcome, "channel rechecked");
    Ok((record, outcome))
}
