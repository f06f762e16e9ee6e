// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{self, TokenVerifier};
use crate::config::AppConfig;
use crate::service::DockerService;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) service: Arc<DockerService>,
    pub(crate) verifier: Arc<dyn TokenVerifier>,
    pub(crate) config: AppConfig,
}

pub fn app(
    service: Arc<DockerService>,
    verifier: Arc<dyn TokenVerifier>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        service,
        verifier,
        config,
    };
    let protected = Router::new()
        .route("/containers", get(http::list_containers)) // GET /containers?all=
        .route("/containers/{container_id}", get(http::container_details))
        .route("/containers/{container_id}/logs", get(http::container_logs))
        .route(
            "/containers/{container_id}/stats",
            get(http::container_stats),
        )
        .route("/images", get(http::list_images))
        .route("/system/version", get(http::daemon_version))
        .route("/system/info", get(http::system_info))
        .route_layer(middleware::from_fn_with_state(
            state.verifier.clone(),
            auth::require_bearer,
        ));
    Router::new()
        .route("/healthz", get(http::healthz)) // open: reports degraded state too
        .route("/version", get(http::version_handler)) // gateway build version
        .merge(protected)
        .route("/logs/ws/{container_id}", get(ws::ws_logs)) // WS, token via query
        .route("/events/ws", get(ws::ws_events))
        .route("/stats/ws/{container_id}", get(ws::ws_stats))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
