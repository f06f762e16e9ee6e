// One-shot GET handlers over the façade

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::AppState;
use crate::error::GatewayError;
use crate::models::HealthResponse;
use crate::version::{NAME, VERSION};

/// GET /healthz — always 200; reports daemon reachability instead of failing.
pub(super) async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let docker_connected = state.service.client().is_connected().await;
    axum::Json(HealthResponse {
        status: "ok".to_string(),
        docker_connected,
    })
}

/// GET /version — gateway name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

#[derive(Deserialize)]
pub(super) struct ListParams {
    #[serde(default = "default_all")]
    all: bool,
}

fn default_all() -> bool {
    true
}

pub(super) async fn list_containers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let list = state.service.list_containers(params.all).await?;
    Ok(axum::Json(list))
}

pub(super) async fn container_details(
    State(state): State<AppState>,
    Path(container_id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let details = state.service.get_container_details(&container_id).await?;
    Ok(axum::Json(details))
}

#[derive(Deserialize)]
pub(super) struct LogsParams {
    tail: Option<u32>,
}

pub(super) async fn container_logs(
    State(state): State<AppState>,
    Path(container_id): Path<String>,
    Query(params): Query<LogsParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let tail = params.tail.unwrap_or(state.config.logs.default_tail);
    let logs = state.service.get_logs(&container_id, tail).await?;
    Ok(axum::Json(logs))
}

pub(super) async fn container_stats(
    State(state): State<AppState>,
    Path(container_id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let record = state.service.get_container_stats(&container_id).await?;
    Ok(axum::Json(record))
}

pub(super) async fn list_images(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let list = state.service.list_images().await?;
    Ok(axum::Json(list))
}

pub(super) async fn daemon_version(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let version = state.service.get_version().await?;
    Ok(axum::Json(version))
}

pub(super) async fn system_info(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let info = state.service.get_system_info().await?;
    Ok(axum::Json(info))
}
