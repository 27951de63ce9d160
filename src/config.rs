use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    pub server: ServerConfig,
}

/// Channel backend. One base URL serves channels, stats and rechecks.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Per-request timeout; expiry surfaces as a transport error.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// How often to log poller counters (syncs, failures, skipped ticks) at INFO level.
    #[serde(default = "default_status_log_interval_secs")]
    pub status_log_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            status_log_interval_secs: default_status_log_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    30
}

fn default_status_log_interval_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let mut config: AppConfig = toml::from_str(s)?;
        config.remote.base_url = config.remote.base_url.trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.remote.base_url.is_empty(),
            "remote.base_url must be non-empty"
        );
        anyhow::ensure!(
            self.remote.base_url.starts_with("http://")
                || self.remote.base_url.starts_with("https://"),
            "remote.base_url must start with http:// or https://, got {}",
            self.remote.base_url
        );
        anyhow::ensure!(
            self.remote.request_timeout_ms > 0,
            "remote.request_timeout_ms must be > 0, got {}",
            self.remote.request_timeout_ms
        );
        anyhow::ensure!(
            self.polling.interval_secs > 0,
            "polling.interval_secs must be > 0, got {}",
            self.polling.interval_secs
        );
        anyhow::ensure!(
            self.polling.status_log_interval_secs > 0,
            "polling.status_log_interval_secs must be > 0, got {}",
            self.polling.status_log_interval_secs
        );
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        Ok(())
    }
}
