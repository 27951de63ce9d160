// JSON handlers: version, projected views, sync status, refresh and recheck intents

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::AppState;
use crate::client::ChannelSource;
use crate::models::{CategoryFilter, ChannelId, StatusFilter, ViewState};
use crate::projector;
use crate::scheduler::RefreshOutcome;
use crate::store::WriteOutcome;
use crate::version::{NAME, VERSION};

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.to_string() })),
    )
        .into_response()
}

/// Query string of GET /api/view; every field is optional.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ViewQuery {
    search: Option<String>,
    category: Option<String>,
    status: Option<String>,
    page: Option<usize>,
}

impl ViewQuery {
    fn into_view_state(self) -> Result<ViewState, Response> {
        let status_filter = match self.status.as_deref() {
            None | Some("") => StatusFilter::All,
            Some(s) => s
                .parse::<StatusFilter>()
                .map_err(|e| error_response(StatusCode::BAD_REQUEST, e))?,
        };
        Ok(ViewState {
            search_term: self.search.unwrap_or_default(),
            category_filter: self
                .category
                .as_deref()
                .filter(|c| !c.is_empty())
                .map(CategoryFilter::from)
                .unwrap_or_default(),
            status_filter,
            current_page: self.page.unwrap_or(1),
        })
    }
}

/// GET /version — service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/view — filtered, paginated channel table plus header stats.
pub(super) async fn view_handler<S: ChannelSource>(
    State(state): State<AppState<S>>,
    Query(query): Query<ViewQuery>,
) -> Response {
    let view = match query.into_view_state() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let snapshot = state.poller.snapshot().await;
    Json(projector::project(&snapshot, &view)).into_response()
}

/// GET /api/summary — overview cards, category uptime, recent issues.
pub(super) async fn summary_handler<S: ChannelSource>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let snapshot = state.poller.snapshot().await;
    Json(projector::project_dashboard(&snapshot))
}

/// GET /api/status — loading/refreshing flags and last sync outcome.
pub(super) async fn status_handler<S: ChannelSource>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    Json(state.poller.status())
}

/// POST /api/refresh — manual full sync; 409 while another sync is in flight.
pub(super) async fn refresh_handler<S: ChannelSource>(State(state): State<AppState<S>>) -> Response {
    match state.poller.refresh().await {
        RefreshOutcome::Completed(report) => Json(report).into_response(),
        RefreshOutcome::AlreadyInFlight => {
            error_response(StatusCode::CONFLICT, "a sync is already in flight")
        }
    }
}

/// POST /api/channels/{id}/recheck — re-probe one channel and return its new record.
pub(super) async fn recheck_handler<S: ChannelSource>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Response {
    let id = match state.poller.store().resolve_id(&id).await {
        Some(resolved) => resolved,
        None => ChannelId::from(id.as_str()),
    };
    match state.poller.recheck(&id).await {
        Ok((record, WriteOutcome::Applied)) => Json(record).into_response(),
        Ok((_, WriteOutcome::NotFound)) => error_response(
            StatusCode::NOT_FOUND,
            format!("channel {} is not in the current snapshot", id),
        ),
        Ok((_, WriteOutcome::Closed)) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, "monitor is shutting down")
        }
        Err(e) => error_response(StatusCode::BAD_GATEWAY, e),
    }
}
