// Image projections

use serde::{Deserialize, Serialize};

/// Summary of a Docker image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSummary {
    pub id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Image size in bytes.
    pub size: i64,
    /// Creation time, seconds since epoch.
    pub created: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageListResponse {
    pub images: Vec<ImageSummary>,
    pub total: usize,
}
