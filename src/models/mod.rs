// API response models (shapes mirror the daemon's JSON, trimmed to what callers need)

mod container;
mod image;
mod stats;
mod system;

pub use container::{
    ContainerDetails, ContainerListResponse, ContainerLogsResponse, ContainerPort,
    ContainerStateInfo, ContainerSummary,
};
pub use image::{ImageListResponse, ImageSummary};
pub use stats::{ContainerStatsRecord, StatsTick};
pub use system::{HealthResponse, SystemInfoSummary, VersionInfo};
