// Channel records as reported by the remote inventory

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable channel identifier; the backend may send a JSON integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::Number(n) => write!(f, "{}", n),
            ChannelId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ChannelId {
    fn from(n: u64) -> Self {
        ChannelId::Number(n)
    }
}

impl From<&str> for ChannelId {
    /// Canonical decimal strings map to `Number`; anything else, "007" included, stays text.
    fn from(s: &str) -> Self {
        match s.parse::<u64>() {
            Ok(n) if n.to_string() == s => ChannelId::Number(n),
            _ => ChannelId::Text(s.to_string()),
        }
    }
}

impl ChannelId {
    /// True when both ids render the same, e.g. `Number(7)` and `Text("7")`.
    pub fn same_as(&self, other: &ChannelId) -> bool {
        match (self, other) {
            (ChannelId::Number(a), ChannelId::Number(b)) => a == b,
            (ChannelId::Text(a), ChannelId::Text(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

/// Liveness of a channel; serializes to lowercase JSON (e.g. "online").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    #[serde(alias = "Online", alias = "ONLINE")]
    Online,
    #[serde(alias = "Offline", alias = "OFFLINE")]
    Offline,
}

impl ChannelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelStatus::Online => "online",
            ChannelStatus::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    pub id: ChannelId,
    pub channel_number: u32,
    pub channel_name: String,
    pub category: String,
    #[serde(default)]
    pub ip_multicast: String,
    #[serde(rename = "logo", default)]
    pub logo_url: String,
    pub status: ChannelStatus,
    pub last_checked: DateTime<Utc>,
    /// Only present when the last check succeeded with timing data.
    #[serde(rename = "responseTime", default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
}

impl ChannelRecord {
    pub fn is_online(&self) -> bool {
        self.status == ChannelStatus::Online
    }
}
