use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub streaming: StreamingConfig,
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Static bearer token accepted by the gateway.
    pub api_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamingConfig {
    /// Bounded queue between the daemon-side producer task and a session
    /// (backpressure: a slow consumer stalls the producer, not the process).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

fn default_channel_capacity() -> usize {
    32
}

fn default_send_timeout_secs() -> u64 {
    10
}

fn default_ping_interval_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsConfig {
    /// Lines returned by the one-shot logs endpoint when `tail` is omitted.
    #[serde(default = "default_tail")]
    pub default_tail: u32,
}

fn default_tail() -> u32 {
    100
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.auth.api_token.is_empty(),
            "auth.api_token must be non-empty"
        );
        anyhow::ensure!(
            self.streaming.channel_capacity > 0,
            "streaming.channel_capacity must be > 0, got {}",
            self.streaming.channel_capacity
        );
        anyhow::ensure!(
            self.streaming.send_timeout_secs > 0,
            "streaming.send_timeout_secs must be > 0, got {}",
            self.streaming.send_timeout_secs
        );
        anyhow::ensure!(
            self.streaming.ping_interval_secs > 0,
            "streaming.ping_interval_secs must be > 0, got {}",
            self.streaming.ping_interval_secs
        );
        anyhow::ensure!(
            self.logs.default_tail > 0,
            "logs.default_tail must be > 0, got {}",
            self.logs.default_tail
        );
        Ok(())
    }
}
