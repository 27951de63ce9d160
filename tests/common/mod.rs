// Shared test helpers: record builders and an in-memory channel source

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use iptv_monitor::client::{ChannelSource, SyncError};
use iptv_monitor::models::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::time::{Duration, Instant};

pub const CATEGORIES: [&str; 3] = ["News", "Sports", "Movies"];

/// Fixed base time plus `secs`.
pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn channel(
    id: u64,
    number: u32,
    name: &str,
    category: &str,
    status: ChannelStatus,
) -> ChannelRecord {
    ChannelRecord {
        id: ChannelId::Number(id),
        channel_number: number,
        channel_name: name.to_string(),
        category: category.to_string(),
        ip_multicast: format!("239.1.1.{}", id % 255),
        logo_url: format!("https://placehold.co/64x64?text={}", id),
        status,
        last_checked: ts(id as i64),
        response_time_ms: match status {
            ChannelStatus::Online => Some(12.0 + id as f64),
            ChannelStatus::Offline => None,
        },
    }
}

/// `n` channels with ids and numbers `1..=n`, categories cycling through [`CATEGORIES`],
/// and every channel whose id is listed in `offline` marked offline.
pub fn channels_with_offline(n: u64, offline: &[u64]) -> Vec<ChannelRecord> {
    (1..=n)
        .map(|id| {
            let status = if offline.contains(&id) {
                ChannelStatus::Offline
            } else {
                ChannelStatus::Online
            };
            let category = CATEGORIES[(id as usize - 1) % CATEGORIES.len()];
            channel(id, id as u32, &format!("Channel {}", id), category, status)
        })
        .collect()
}

pub fn channels(n: u64) -> Vec<ChannelRecord> {
    channels_with_offline(n, &[])
}

/// Same records with their ids sent as JSON strings ("1", "2", ...).
pub fn with_text_ids(channels: Vec<ChannelRecord>) -> Vec<ChannelRecord> {
    channels
        .into_iter()
        .map(|mut c| {
            c.id = ChannelId::Text(c.id.to_string());
            c
        })
        .collect()
}

/// Stats block consistent with `channels`.
pub fn stats_for(channels: &[ChannelRecord]) -> AggregateStats {
    let mut category_stats: BTreeMap<String, CategoryCounts> = BTreeMap::new();
    for c in channels {
        let entry = category_stats.entry(c.category.clone()).or_default();
        entry.total += 1;
        if c.is_online() {
            entry.online += 1;
        } else {
            entry.offline += 1;
        }
    }
    let total = channels.len() as u64;
    let online = channels.iter().filter(|c| c.is_online()).count() as u64;
    let uptime = if total == 0 {
        0.0
    } else {
        online as f64 / total as f64 * 100.0
    };
    AggregateStats {
        total_channels: total,
        online_channels: online,
        offline_channels: total - online,
        uptime_percent: format!("{:.1}", uptime),
        category_stats,
        last_updated_at: ts(10_000),
    }
}

/// In-memory `ChannelSource` that counts calls and can hold the next channel fetch.
pub struct FakeSource {
    channels: Mutex<Result<Vec<ChannelRecord>, SyncError>>,
    stats: Mutex<Result<AggregateStats, SyncError>>,
    rechecks: Mutex<HashMap<ChannelId, Result<ChannelRecord, SyncError>>>,
    hold_next: Mutex<Option<Arc<Notify>>>,
    pub channel_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
    pub recheck_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(channels: Vec<ChannelRecord>) -> Self {
        let stats = stats_for(&channels);
        Self {
            channels: Mutex::new(Ok(channels)),
            stats: Mutex::new(Ok(stats)),
            rechecks: Mutex::new(HashMap::new()),
            hold_next: Mutex::new(None),
            channel_calls: AtomicUsize::new(0),
            stats_calls: AtomicUsize::new(0),
            recheck_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_channels(&self, result: Result<Vec<ChannelRecord>, SyncError>) {
        *self.channels.lock().unwrap() = result;
    }

    pub fn set_stats(&self, result: Result<AggregateStats, SyncError>) {
        *self.stats.lock().unwrap() = result;
    }

    pub fn set_recheck(&self, id: ChannelId, result: Result<ChannelRecord, SyncError>) {
        self.rechecks.lock().unwrap().insert(id, result);
    }

    /// The next `fetch_channels` call blocks until the returned `Notify` is signalled.
    pub fn hold_next_fetch(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold_next.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn channel_calls(&self) -> usize {
        self.channel_calls.load(Ordering::SeqCst)
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }
}

impl ChannelSource for FakeSource {
    async fn fetch_channels(&self) -> Result<Vec<ChannelRecord>, SyncError> {
        self.channel_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.hold_next.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let result = self.channels.lock().unwrap().clone();
        result
    }

    async fn fetch_stats(&self) -> Result<AggregateStats, SyncError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.stats.lock().unwrap().clone();
        result
    }

    async fn recheck_channel(&self, id: &ChannelId) -> Result<ChannelRecord, SyncError> {
        self.recheck_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.rechecks.lock().unwrap().get(id).cloned();
        result.unwrap_or_else(|| Err(SyncError::Protocol(format!("no recheck for {}", id))))
    }
}

/// Polls `cond` every few milliseconds; panics after two seconds.
pub async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
