// Remote sync client: stateless request/response calls against the channel backend.
// No retries; the poll schedule is the retry policy.

use crate::models::{AggregateStats, ChannelId, ChannelRecord, Envelope};
use crate::version::USER_AGENT;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum SyncError {
    /// Network, DNS, timeout, body read, or a non-2xx status.
    #[error("transport error: {0}")]
    Transport(String),
    /// Malformed body, `success: false`, or a success envelope without data.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl SyncError {
    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, SyncError::Protocol(_))
    }
}

/// Source of channel data. Implemented over HTTP, and by in-memory doubles in tests.
pub trait ChannelSource: Send + Sync + 'static {
    fn fetch_channels(&self) -> impl Future<Output = Result<Vec<ChannelRecord>, SyncError>> + Send;

    fn fetch_stats(&self) -> impl Future<Output = Result<AggregateStats, SyncError>> + Send;

    /// Asks the backend to re-probe one channel and returns its fresh record.
    fn recheck_channel(
        &self,
        id: &ChannelId,
    ) -> impl Future<Output = Result<ChannelRecord, SyncError>> + Send;
}

pub struct HttpChannelSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChannelSource {
    pub fn new(base_url: &str, request_timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<T, SyncError> {
        let response = request
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("{}: {}", path, describe(&e))))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Transport(format!(
                "{} returned HTTP {}",
                path, status
            )));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| {
                SyncError::Transport(format!("{}: reading body: {}", path, describe(&e)))
            })?;
        decode_envelope(&body, path)
    }
}

impl ChannelSource for HttpChannelSource {
    #[instrument(skip(self), fields(client = "http", operation = "fetch_channels"))]
    async fn fetch_channels(&self) -> Result<Vec<ChannelRecord>, SyncError> {
        let path = "/api/channels";
        let url = format!("{}{}", self.base_url, path);
        self.send(self.http.get(url), path).await
    }

    #[instrument(skip(self), fields(client = "http", operation = "fetch_stats"))]
    async fn fetch_stats(&self) -> Result<AggregateStats, SyncError> {
        let path = "/api/dashboard/stats";
        let url = format!("{}{}", self.base_url, path);
        self.send(self.http.get(url), path).await
    }

    #[instrument(skip(self), fields(client = "http", operation = "recheck_channel", id = %id))]
    async fn recheck_channel(&self, id: &ChannelId) -> Result<ChannelRecord, SyncError> {
        let path = format!("/api/channels/{}/check", id);
        let url = format!("{}{}", self.base_url, path);
        self.send(self.http.post(url), &path).await
    }
}

/// Unwraps a `{success, data}` body. Anything other than `success: true` with data is a protocol error.
pub fn decode_envelope<T: DeserializeOwned>(body: &[u8], path: &str) -> Result<T, SyncError> {
    let envelope: Envelope<T> = serde_json::from_slice(body)
        .map_err(|e| SyncError::Protocol(format!("{}: malformed body: {}", path, e)))?;
    if !envelope.success {
        let reason = envelope.message.as_deref().unwrap_or("no message");
        return Err(SyncError::Protocol(format!(
            "{} reported success=false ({})",
            path, reason
        )));
    }
    envelope
        .data
        .ok_or_else(|| SyncError::Protocol(format!("{}: success envelope without data", path)))
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out ({})", e)
    } else if e.is_connect() {
        format!("connection failed ({})", e)
    } else {
        e.to_string()
    }
}
