// Integration tests: HTTP intent boundary over a running poller

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::*;
use iptv_monitor::client::SyncError;
use iptv_monitor::models::{ChannelId, ChannelRecord, ChannelStatus};
use iptv_monitor::routes;
use iptv_monitor::scheduler::{self, Poller, PollerConfig};
use iptv_monitor::store::SnapshotStore;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const OFFLINE: [u64; 12] = [2, 5, 8, 11, 14, 17, 20, 23, 26, 29, 32, 45];

async fn test_app() -> (TestServer, Arc<FakeSource>, Poller<FakeSource>) {
    serve(channels_with_offline(45, &OFFLINE)).await
}

async fn serve(list: Vec<ChannelRecord>) -> (TestServer, Arc<FakeSource>, Poller<FakeSource>) {
    let source = Arc::new(FakeSource::new(list));
    let poller = scheduler::spawn(
        source.clone(),
        Arc::new(SnapshotStore::new()),
        PollerConfig {
            interval: Duration::from_secs(3600),
            status_log_interval: Duration::from_secs(3600),
        },
    );
    let handle = poller.handle();
    wait_until("initial sync", || {
        !handle.status().loading && !handle.is_syncing()
    })
    .await;
    let server = TestServer::new(routes::app(poller.handle()));
    (server, source, poller)
}

#[tokio::test]
async fn test_version_endpoint() {
    let (server, _, poller) = test_app().await;
    let response = server.get("/version").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(
        json.get("name").and_then(|v| v.as_str()),
        Some("iptv-monitor")
    );
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
    poller.stop().await;
}

#[tokio::test]
async fn test_view_defaults_to_first_page_of_everything() {
    let (server, _, poller) = test_app().await;
    let response = server.get("/api/view").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["filteredCount"], 45);
    assert_eq!(json["totalPages"], 3);
    assert_eq!(json["currentPage"], 1);
    assert_eq!(json["channels"].as_array().unwrap().len(), 20);
    assert_eq!(json["hasNext"], true);
    assert_eq!(json["categories"][0], "All");
    assert_eq!(json["stats"]["totalChannels"], 45);
    poller.stop().await;
}

#[tokio::test]
async fn test_view_applies_status_filter() {
    let (server, _, poller) = test_app().await;
    let response = server
        .get("/api/view")
        .add_query_param("status", "offline")
        .await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["filteredCount"], 12);
    assert_eq!(json["totalPages"], 1);
    let channels = json["channels"].as_array().unwrap();
    assert_eq!(channels.len(), 12);
    assert!(channels.iter().all(|c| c["status"] == "offline"));
    poller.stop().await;
}

#[tokio::test]
async fn test_view_with_search_category_and_page() {
    let (server, _, poller) = test_app().await;
    let response = server
        .get("/api/view")
        .add_query_param("search", "channel 1")
        .add_query_param("category", "News")
        .add_query_param("page", "2")
        .await;
    response.assert_status_ok();
    let json: Value = response.json();
    // "Channel 1", "Channel 10".."Channel 19" in News: ids 1, 10, 13, 16, 19.
    assert_eq!(json["filteredCount"], 5);
    assert!(json["channels"].as_array().unwrap().is_empty());
    assert_eq!(json["hasPrevious"], true);
    poller.stop().await;
}

#[tokio::test]
async fn test_view_rejects_unknown_status() {
    let (server, _, poller) = test_app().await;
    let response = server
        .get("/api/view")
        .add_query_param("status", "paused")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("paused"));
    poller.stop().await;
}

#[tokio::test]
async fn test_summary_endpoint() {
    let (server, _, poller) = test_app().await;
    let response = server.get("/api/summary").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["summary"]["offlineChannels"], 12);
    assert_eq!(json["monitoredChannels"], 45);
    assert_eq!(json["reportedCategories"], 3);
    let issues = json["recentIssues"].as_array().unwrap();
    assert_eq!(issues.len(), 5);
    assert_eq!(issues[0]["id"], 45);
    poller.stop().await;
}

#[tokio::test]
async fn test_status_endpoint_after_initial_sync() {
    let (server, _, poller) = test_app().await;
    let response = server.get("/api/status").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["loading"], false);
    assert_eq!(json["refreshing"], false);
    assert!(json["lastSyncAt"].is_string());
    assert!(json["lastError"].is_null());
    poller.stop().await;
}

#[tokio::test]
async fn test_refresh_endpoint_runs_full_sync() {
    let (server, source, poller) = test_app().await;
    let response = server.post("/api/refresh").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["channels"]["outcome"], "applied");
    assert_eq!(json["stats"]["outcome"], "applied");
    assert_eq!(source.channel_calls(), 2);
    poller.stop().await;
}

#[tokio::test]
async fn test_refresh_endpoint_conflicts_while_sync_in_flight() {
    let (server, source, poller) = test_app().await;
    let gate = source.hold_next_fetch();
    let handle = poller.handle();
    let background = tokio::spawn(async move { handle.refresh().await });
    wait_until("held refresh", || source.channel_calls() == 2).await;

    let response = server.post("/api/refresh").await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(source.channel_calls(), 2);

    gate.notify_one();
    background.await.unwrap();
    poller.stop().await;
}

#[tokio::test]
async fn test_refresh_reports_failed_fetch() {
    let (server, source, poller) = test_app().await;
    source.set_channels(Err(SyncError::Transport("connection refused".into())));
    let response = server.post("/api/refresh").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["channels"]["outcome"], "failed");
    assert_eq!(json["channels"]["error"]["kind"], "transport");
    poller.stop().await;
}

#[tokio::test]
async fn test_recheck_endpoint_patches_channel() {
    let (server, source, poller) = test_app().await;
    let fresh = channel(5, 5, "Channel 5", "Sports", ChannelStatus::Online);
    source.set_recheck(ChannelId::Number(5), Ok(fresh.clone()));

    let response = server.post("/api/channels/5/recheck").await;
    response.assert_status_ok();
    let record: ChannelRecord = response.json();
    assert_eq!(record, fresh);

    let view: Value = server
        .get("/api/view")
        .add_query_param("status", "Offline")
        .await
        .json();
    assert_eq!(view["filteredCount"], 11);
    poller.stop().await;
}

#[tokio::test]
async fn test_recheck_endpoint_unknown_channel_is_404() {
    let (server, source, poller) = test_app().await;
    source.set_recheck(
        ChannelId::Number(999),
        Ok(channel(999, 999, "Ghost", "News", ChannelStatus::Online)),
    );
    let response = server.post("/api/channels/999/recheck").await;
    response.assert_status(StatusCode::NOT_FOUND);
    poller.stop().await;
}

#[tokio::test]
async fn test_recheck_endpoint_remote_failure_is_502() {
    let (server, source, poller) = test_app().await;
    source.set_recheck(
        ChannelId::Number(3),
        Err(SyncError::Transport("timed out".into())),
    );
    let response = server.post("/api/channels/3/recheck").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("timed out"));
    poller.stop().await;
}

#[tokio::test]
async fn test_recheck_endpoint_with_string_ids() {
    let (server, source, poller) = serve(with_text_ids(channels_with_offline(10, &[7]))).await;
    let mut fresh = channel(7, 7, "Channel 7", "News", ChannelStatus::Online);
    fresh.id = ChannelId::Text("7".into());
    source.set_recheck(ChannelId::Text("7".into()), Ok(fresh.clone()));

    let response = server.post("/api/channels/7/recheck").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["id"], "7");
    assert_eq!(json["status"], "online");

    let view: Value = server
        .get("/api/view")
        .add_query_param("status", "offline")
        .await
        .json();
    assert_eq!(view["filteredCount"], 0);
    poller.stop().await;
}

#[tokio::test]
async fn test_recheck_endpoint_keeps_leading_zeros() {
    let (server, source, poller) = test_app().await;
    source.set_recheck(
        ChannelId::Number(8),
        Ok(channel(8, 8, "Channel 8", "Sports", ChannelStatus::Online)),
    );

    // "008" is a different id from channel 8; there is no reply for it.
    let response = server.post("/api/channels/008/recheck").await;
    response.assert_status(StatusCode::BAD_GATEWAY);

    let view: Value = server
        .get("/api/view")
        .add_query_param("status", "offline")
        .await
        .json();
    assert_eq!(view["filteredCount"], 12);
    poller.stop().await;
}
