// View state coming from the dashboard, and the projections handed back to it

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ChannelRecord, ChannelStatus};

/// Label used by the dashboard for "no filter" in both dropdowns.
pub const ALL: &str = "All";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Online,
    Offline,
}

impl StatusFilter {
    pub fn matches(&self, status: ChannelStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Online => status == ChannelStatus::Online,
            StatusFilter::Offline => status == ChannelStatus::Offline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status filter {0:?}; expected All, Online or Offline")]
pub struct UnknownStatusFilter(pub String);

impl FromStr for StatusFilter {
    type Err = UnknownStatusFilter;

    /// Case-insensitive, so "offline" and "Offline" are the same filter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "online" => Ok(StatusFilter::Online),
            "offline" => Ok(StatusFilter::Offline),
            _ => Err(UnknownStatusFilter(s.to_string())),
        }
    }
}

/// `All`, or an exact (case-sensitive) category value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Exact(String),
}

impl CategoryFilter {
    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Exact(c) => c == category,
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(s: &str) -> Self {
        if s == ALL {
            CategoryFilter::All
        } else {
            CategoryFilter::Exact(s.to_string())
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL),
            CategoryFilter::Exact(c) => f.write_str(c),
        }
    }
}

/// Ephemeral search/filter/page state owned by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub search_term: String,
    pub category_filter: CategoryFilter,
    pub status_filter: StatusFilter,
    /// 1-indexed; not clamped, out-of-range pages project to an empty slice.
    pub current_page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            category_filter: CategoryFilter::All,
            status_filter: StatusFilter::All,
            current_page: 1,
        }
    }
}

/// Filtered, paginated subset of the snapshot ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedView {
    pub channels: Vec<ChannelRecord>,
    pub filtered_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub has_previous: bool,
    pub has_next: bool,
    /// 1-based "showing X to Y" bounds; both 0 when the page is empty.
    pub showing_from: usize,
    pub showing_to: usize,
    /// Always starts with "All", followed by categories in first-seen snapshot order.
    pub categories: Vec<String>,
    /// Header cards; `None` until the first stats fetch succeeds.
    pub stats: Option<StatsSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthGrade {
    Excellent,
    Good,
    NeedsAttention,
}

impl HealthGrade {
    pub fn from_uptime(uptime: Option<f64>) -> Self {
        match uptime {
            Some(u) if u >= 95.0 => HealthGrade::Excellent,
            Some(u) if u >= 80.0 => HealthGrade::Good,
            _ => HealthGrade::NeedsAttention,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUptime {
    pub name: String,
    pub total: u64,
    pub online: u64,
    pub offline: u64,
    pub uptime_percent: f64,
}

/// Header cards of the dashboard, derived from the aggregate stats block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_channels: u64,
    pub online_channels: u64,
    pub offline_channels: u64,
    pub online_percent: f64,
    pub offline_percent: f64,
    pub uptime: String,
    pub uptime_value: Option<f64>,
    pub health: HealthGrade,
    pub categories: Vec<CategoryUptime>,
}

/// Everything the overview page shows besides the channel table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub summary: Option<StatsSummary>,
    pub recent_issues: Vec<ChannelRecord>,
    pub monitored_channels: usize,
    pub reported_categories: usize,
}
