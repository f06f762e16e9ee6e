// One-shot query façade: one adapter call per operation, normalized into
// schema-shaped models. No HTTP knowledge here; routes wrap these.

use crate::docker::DockerClient;
use crate::error::GatewayError;
use crate::models::{
    ContainerDetails, ContainerListResponse, ContainerLogsResponse, ContainerPort,
    ContainerStateInfo, ContainerStatsRecord, ContainerSummary, ImageListResponse, ImageSummary,
    SystemInfoSummary, VersionInfo,
};
use crate::stats;
use std::sync::Arc;
use tracing::warn;

pub struct DockerService {
    client: Arc<DockerClient>,
}

impl DockerService {
    pub fn new(client: Arc<DockerClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<DockerClient> {
        &self.client
    }

    pub async fn list_containers(&self, all: bool) -> Result<ContainerListResponse, GatewayError> {
        let raw = self.client.list_containers(all).await?;
        let containers = summarize_containers(raw);
        let total = containers.len();
        Ok(ContainerListResponse { containers, total })
    }

    pub async fn get_container_details(
        &self,
        container_id: &str,
    ) -> Result<ContainerDetails, GatewayError> {
        let inspected = self.client.inspect_container(container_id).await?;
        let state = inspected.state.as_ref();
        let details = ContainerDetails {
            id: inspected.id.clone().unwrap_or_else(|| container_id.to_string()),
            name: inspected
                .name
                .as_deref()
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_default(),
            image: inspected
                .config
                .as_ref()
                .and_then(|c| c.image.clone())
                .or(inspected.image.clone())
                .unwrap_or_default(),
            created: epoch_seconds(inspected.created.as_deref()),
            state: ContainerStateInfo {
                status: state
                    .and_then(|s| s.status.as_ref())
                    .map(|s| format!("{:?}", s).to_lowercase())
                    .unwrap_or_else(|| "unknown".to_string()),
                running: state.and_then(|s| s.running).unwrap_or(false),
                paused: state.and_then(|s| s.paused).unwrap_or(false),
                restarting: state.and_then(|s| s.restarting).unwrap_or(false),
                pid: state.and_then(|s| s.pid).unwrap_or(0),
                started_at: epoch_seconds(state.and_then(|s| s.started_at.as_deref())),
                finished_at: epoch_seconds(state.and_then(|s| s.finished_at.as_deref())),
            },
        };
        Ok(details)
    }

    pub async fn get_logs(
        &self,
        container_id: &str,
        tail: u32,
    ) -> Result<ContainerLogsResponse, GatewayError> {
        let logs = self.client.collect_logs(container_id, tail).await?;
        Ok(ContainerLogsResponse {
            container_id: container_id.to_string(),
            logs,
            tail,
        })
    }

    /// One poll; the daemon bundles the previous cycle, so the CPU delta
    /// needs no second adapter call.
    pub async fn get_container_stats(
        &self,
        container_id: &str,
    ) -> Result<ContainerStatsRecord, GatewayError> {
        let raw = self.client.stats_once(container_id).await?;
        Ok(stats::normalize(&raw, container_id))
    }

    pub async fn list_images(&self) -> Result<ImageListResponse, GatewayError> {
        let raw = self.client.list_images().await?;
        let images: Vec<ImageSummary> = raw
            .into_iter()
            .map(|img| ImageSummary {
                id: img.id,
                tags: img.repo_tags,
                size: img.size,
                created: img.created,
            })
            .collect();
        let total = images.len();
        Ok(ImageListResponse { images, total })
    }

    pub async fn get_version(&self) -> Result<VersionInfo, GatewayError> {
        let v = self.client.version().await?;
        Ok(VersionInfo {
            api_version: v.api_version.unwrap_or_default(),
            docker_version: v.version.unwrap_or_default(),
            os: v.os.unwrap_or_default(),
            arch: v.arch.unwrap_or_default(),
        })
    }

    pub async fn get_system_info(&self) -> Result<SystemInfoSummary, GatewayError> {
        let info = self.client.info().await?;
        Ok(SystemInfoSummary {
            containers: info.containers.unwrap_or(0),
            containers_running: info.containers_running.unwrap_or(0),
            containers_paused: info.containers_paused.unwrap_or(0),
            containers_stopped: info.containers_stopped.unwrap_or(0),
            images: info.images.unwrap_or(0),
            ncpu: info.ncpu.unwrap_or(0),
            mem_total: info.mem_total.unwrap_or(0),
            server_version: info.server_version.unwrap_or_default(),
            operating_system: info.operating_system.unwrap_or_default(),
        })
    }
}

fn epoch_seconds(value: Option<&str>) -> i64 {
    match value {
        // The daemon reports the zero time ("0001-01-01T00:00:00Z") for
        // containers that never started or finished.
        None => 0,
        Some(s) if s.starts_with("0001-01-01") => 0,
        Some(s) => stats::parse_timestamp(&serde_json::Value::String(s.to_string())),
    }
}

/// Project daemon container summaries into the list shape, skipping entries
/// that cannot be addressed (no id). One bad entry never aborts the list.
pub fn summarize_containers(
    raw: Vec<bollard::models::ContainerSummary>,
) -> Vec<ContainerSummary> {
    let mut out = Vec::with_capacity(raw.len());
    for c in raw {
        match summarize_container(c) {
            Some(summary) => out.push(summary),
            None => warn!("skipping container entry without id"),
        }
    }
    out
}

fn summarize_container(c: bollard::models::ContainerSummary) -> Option<ContainerSummary> {
    let id = c.id.filter(|id| !id.is_empty())?;
    let name = c
        .names
        .and_then(|n| n.first().cloned())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| id.clone());
    let ports = c
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(|p| ContainerPort {
            container_port: p.private_port,
            host_port: p.public_port,
            protocol: p
                .typ
                .map(|t| format!("{:?}", t).to_lowercase())
                .unwrap_or_else(|| "tcp".to_string()),
            host_ip: p.ip,
        })
        .collect();
    Some(ContainerSummary {
        id,
        name,
        image: c.image.unwrap_or_default(),
        status: c.status.unwrap_or_default(),
        state: c
            .state
            .map(|s| format!("{:?}", s).to_lowercase())
            .unwrap_or_else(|| "unknown".to_string()),
        created: c.created.unwrap_or(0),
        ports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_container(id: Option<&str>, name: &str) -> bollard::models::ContainerSummary {
        bollard::models::ContainerSummary {
            id: id.map(|s| s.to_string()),
            names: Some(vec![format!("/{name}")]),
            image: Some("alpine:latest".to_string()),
            status: Some("Up 2 hours".to_string()),
            created: Some(1_700_000_000),
            ..Default::default()
        }
    }

    #[test]
    fn summarize_skips_malformed_entries_and_keeps_the_rest() {
        let raw = vec![
            raw_container(Some("aaa"), "one"),
            raw_container(None, "broken"),
            raw_container(Some("bbb"), "two"),
            raw_container(Some(""), "also-broken"),
        ];
        let out = summarize_containers(raw);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "aaa");
        assert_eq!(out[0].name, "one");
        assert_eq!(out[1].id, "bbb");
    }

    #[test]
    fn epoch_seconds_treats_zero_time_as_never() {
        assert_eq!(epoch_seconds(Some("0001-01-01T00:00:00Z")), 0);
        assert_eq!(epoch_seconds(Some("2024-01-01T00:00:00Z")), 1_704_067_200);
        assert_eq!(epoch_seconds(None), 0);
    }

    #[test]
    fn summarize_falls_back_to_id_when_name_missing() {
        let mut c = raw_container(Some("ccc"), "x");
        c.names = None;
        let out = summarize_containers(vec![c]);
        assert_eq!(out[0].name, "ccc");
        assert_eq!(out[0].created, 1_700_000_000);
    }
}
