// Gateway error taxonomy and HTTP mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures surfaced by the adapter and façade. Each variant has a fixed
/// HTTP shape so route handlers can just use `?`.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The daemon reported the container/image absent (404).
    #[error("'{0}' not found")]
    TargetNotFound(String),

    /// The daemon could not be reached at all (503).
    #[error("Docker service is unavailable")]
    DaemonUnavailable,

    /// The daemon was reachable but returned a fault (502).
    #[error("Docker daemon returned an error: {0}")]
    DaemonError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::TargetNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::DaemonUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::DaemonError(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<bollard::errors::Error> for GatewayError {
    fn from(e: bollard::errors::Error) -> Self {
        match e {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
                ..
            } => GatewayError::TargetNotFound(message),
            bollard::errors::Error::DockerResponseServerError {
                status_code,
                message,
                ..
            } => GatewayError::DaemonError(format!("{} ({})", message, status_code)),
            // Anything that is not a daemon response means we never got one:
            // socket errors, timeouts, unparsable bodies mid-transfer.
            _ => GatewayError::DaemonUnavailable,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daemon_404_maps_to_target_not_found() {
        let e = bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            message: "No such container: abc".into(),
        };
        let mapped = GatewayError::from(e);
        assert!(matches!(mapped, GatewayError::TargetNotFound(_)));
        assert_eq!(mapped.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn daemon_500_maps_to_daemon_error() {
        let e = bollard::errors::Error::DockerResponseServerError {
            status_code: 500,
            message: "driver failed".into(),
        };
        let mapped = GatewayError::from(e);
        assert!(matches!(mapped, GatewayError::DaemonError(_)));
        assert_eq!(mapped.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn unavailable_maps_to_503() {
        assert_eq!(
            GatewayError::DaemonUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
