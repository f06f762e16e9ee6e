// Daemon-level projections: health, version, system info

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub docker_connected: bool,
}

/// Docker version information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub api_version: String,
    pub docker_version: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub arch: String,
}

/// Daemon health snapshot: counts and capacity, not per-container data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfoSummary {
    pub containers: i64,
    pub containers_running: i64,
    pub containers_paused: i64,
    pub containers_stopped: i64,
    pub images: i64,
    pub ncpu: i64,
    pub mem_total: i64,
    pub server_version: String,
    pub operating_system: String,
}
