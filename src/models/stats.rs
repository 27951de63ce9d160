// Aggregate statistics block from /api/dashboard/stats

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub total: u64,
    pub online: u64,
    pub offline: u64,
}

/// Counters computed by the remote source. `online + offline = total` is expected but not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_channels: u64,
    pub online_channels: u64,
    pub offline_channels: u64,
    /// Display string (e.g. "97.5"); see [`AggregateStats::uptime_value`].
    #[serde(rename = "uptime", deserialize_with = "string_or_number")]
    pub uptime_percent: String,
    /// Sorted by category name; may disagree with the live channel list.
    #[serde(default)]
    pub category_stats: BTreeMap<String, CategoryCounts>,
    #[serde(rename = "lastUpdated")]
    pub last_updated_at: DateTime<Utc>,
}

impl AggregateStats {
    /// Parsed uptime percentage, or `None` when the remote string is not a finite number.
    pub fn uptime_value(&self) -> Option<f64> {
        self.uptime_percent
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
