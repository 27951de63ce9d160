// HTTP intent boundary: the dashboard front end reads projections and forwards
// search/filter/page, manual refresh and per-row recheck through here.

mod http;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::client::ChannelSource;
use crate::scheduler::PollerHandle;

pub(crate) struct AppState<S> {
    pub(crate) poller: PollerHandle<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            poller: self.poller.clone(),
        }
    }
}

pub fn app<S: ChannelSource>(poller: PollerHandle<S>) -> Router {
    let state = AppState { poller };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/view", get(http::view_handler::<S>)) // GET /api/view
        .route("/api/summary", get(http::summary_handler::<S>)) // GET /api/summary
        .route("/api/status", get(http::status_handler::<S>)) // GET /api/status
        .route("/api/refresh", post(http::refresh_handler::<S>)) // POST /api/refresh
        .route(
            "/api/channels/{id}/recheck",
            post(http::recheck_handler::<S>),
        ) // POST /api/channels/{id}/recheck
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
