// View projector: pure functions from (snapshot, view state) to what the dashboard renders.
// No caching; callers re-project whenever the snapshot or the view state changes.

use crate::models::{
    ALL, AggregateStats, CategoryUptime, ChannelRecord, DashboardView, HealthGrade, ProjectedView,
    StatsSummary, ViewState,
};
use crate::store::Snapshot;
use std::collections::HashSet;

/// Rows per page in the channel table.
pub const PAGE_SIZE: usize = 20;

/// Offline channels listed under "recent issues".
pub const RECENT_ISSUES_LIMIT: usize = 5;

pub fn project(snapshot: &Snapshot, view: &ViewState) -> ProjectedView {
    let filtered: Vec<&ChannelRecord> = snapshot
        .channels
        .iter()
        .filter(|c| matches_view(c, view))
        .collect();
    let filtered_count = filtered.len();
    let total_pages = total_pages(filtered_count);
    let range = page_range(view.current_page, filtered_count);

    let channels: Vec<ChannelRecord> = filtered[range.clone()]
        .iter()
        .map(|c| (*c).clone())
        .collect();
    let (showing_from, showing_to) = if range.is_empty() {
        (0, 0)
    } else {
        (range.start + 1, range.end)
    };

    ProjectedView {
        channels,
        filtered_count,
        total_pages,
        current_page: view.current_page,
        has_previous: view.current_page > 1,
        has_next: view.current_page < total_pages,
        showing_from,
        showing_to,
        categories: categories(&snapshot.channels),
        stats: snapshot.stats.as_deref().map(summarize_stats),
    }
}

/// Conjunction of the search, category and status predicates.
pub fn matches_view(channel: &ChannelRecord, view: &ViewState) -> bool {
    matches_search(channel, &view.search_term)
        && view.category_filter.matches(&channel.category)
        && view.status_filter.matches(channel.status)
}

/// Empty term matches everything; otherwise a case-insensitive name match
/// or a substring of the decimal channel number.
pub fn matches_search(channel: &ChannelRecord, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    channel
        .channel_name
        .to_lowercase()
        .contains(&term.to_lowercase())
        || channel.channel_number.to_string().contains(term)
}

/// "All" followed by each distinct category in first-seen order.
pub fn categories(channels: &[ChannelRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    std::iter::once(ALL.to_string())
        .chain(
            channels
                .iter()
                .filter(|c| seen.insert(c.category.as_str()))
                .map(|c| c.category.clone()),
        )
        .collect()
}

/// `max(1, ceil(count / PAGE_SIZE))`.
pub fn total_pages(filtered_count: usize) -> usize {
    filtered_count.div_ceil(PAGE_SIZE).max(1)
}

/// Index range of `page` (1-indexed) within `len` filtered rows; empty when out of range.
fn page_range(page: usize, len: usize) -> std::ops::Range<usize> {
    let Some(start) = page.checked_sub(1).and_then(|p| p.checked_mul(PAGE_SIZE)) else {
        return 0..0;
    };
    if start >= len {
        return 0..0;
    }
    start..(start + PAGE_SIZE).min(len)
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Header cards and per-category uptime, exactly as the stats block reports them.
/// Categories are not reconciled with the live channel list.
pub fn summarize_stats(stats: &AggregateStats) -> StatsSummary {
    let uptime_value = stats.uptime_value();
    StatsSummary {
        total_channels: stats.total_channels,
        online_channels: stats.online_channels,
        offline_channels: stats.offline_channels,
        online_percent: percent(stats.online_channels, stats.total_channels),
        offline_percent: percent(stats.offline_channels, stats.total_channels),
        uptime: stats.uptime_percent.clone(),
        uptime_value,
        health: HealthGrade::from_uptime(uptime_value),
        categories: stats
            .category_stats
            .iter()
            .map(|(name, counts)| CategoryUptime {
                name: name.clone(),
                total: counts.total,
                online: counts.online,
                offline: counts.offline,
                uptime_percent: percent(counts.online, counts.total),
            })
            .collect(),
    }
}

/// Offline channels, most recently checked first; ties keep snapshot order.
pub fn recent_issues(channels: &[ChannelRecord], limit: usize) -> Vec<ChannelRecord> {
    let mut offline: Vec<&ChannelRecord> = channels.iter().filter(|c| !c.is_online()).collect();
    offline.sort_by(|a, b| b.last_checked.cmp(&a.last_checked));
    offline.into_iter().take(limit).cloned().collect()
}

pub fn project_dashboard(snapshot: &Snapshot) -> DashboardView {
    let stats = snapshot.stats.as_deref();
    DashboardView {
        summary: stats.map(summarize_stats),
        recent_issues: recent_issues(&snapshot.channels, RECENT_ISSUES_LIMIT),
        monitored_channels: snapshot.channels.len(),
        reported_categories: stats.map_or(0, |s| s.category_stats.len()),
    }
}
