// Container projections of daemon inspection data. Recreated on every query,
// never cached; no identity beyond the daemon's own IDs.

use serde::{Deserialize, Serialize};

/// One published port of a running container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerPort {
    pub container_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_port: Option<u16>,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
}

/// Summary of a container for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
    pub state: String,
    /// Creation time, seconds since epoch.
    pub created: i64,
    #[serde(default)]
    pub ports: Vec<ContainerPort>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerListResponse {
    pub containers: Vec<ContainerSummary>,
    pub total: usize,
}

/// Runtime state block of an inspected container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerStateInfo {
    pub status: String,
    pub running: bool,
    pub paused: bool,
    pub restarting: bool,
    pub pid: i64,
    /// Epoch seconds; 0 when the daemon reports no/unparsable timestamp.
    pub started_at: i64,
    pub finished_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerDetails {
    pub id: String,
    pub name: String,
    pub image: String,
    pub created: i64,
    pub state: ContainerStateInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerLogsResponse {
    pub container_id: String,
    pub logs: String,
    pub tail: u32,
}
