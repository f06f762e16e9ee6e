// Normalized stats records. Derived per call/tick, never persisted.

use serde::{Deserialize, Serialize};

/// Full one-shot stats record for a container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerStatsRecord {
    pub container_id: String,
    /// Instantaneous CPU usage, percent (two decimals).
    pub cpu_percent: f64,
    pub memory_usage: u64,
    pub memory_limit: u64,
    pub memory_percent: f64,
    /// Bytes received, summed across all interfaces.
    pub network_rx: u64,
    pub network_tx: u64,
    /// Block I/O bytes, summed across all devices.
    pub block_read: u64,
    pub block_write: u64,
}

/// One streaming tick. Wire contract: exactly these four fields, one
/// self-contained JSON text record per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsTick {
    pub cpu_percent: f64,
    pub memory_usage: u64,
    pub memory_percent: f64,
    /// ISO-8601, UTC.
    pub timestamp: String,
}
