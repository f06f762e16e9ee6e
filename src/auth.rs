// Caller verification seam. The gateway never parses token internals; a
// verifier decides, and routes only ask yes/no before serving or upgrading.

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> bool;
}

/// Verifier backed by the single configured API token.
pub struct StaticTokenVerifier {
    token: String,
}

impl StaticTokenVerifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> bool {
        !self.token.is_empty() && token == self.token
    }
}

/// Bearer middleware for the one-shot routes. WebSocket routes check their
/// query token themselves, before the upgrade.
pub async fn require_bearer(
    State(verifier): State<Arc<dyn TokenVerifier>>,
    req: Request,
    next: Next,
) -> Response {
    let authorized = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| verifier.verify(token));
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "detail": "Invalid token" })),
        )
            .into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_verifier_accepts_only_the_configured_token() {
        let v = StaticTokenVerifier::new("secret");
        assert!(v.verify("secret"));
        assert!(!v.verify("wrong"));
        assert!(!v.verify(""));
    }

    #[test]
    fn empty_configured_token_rejects_everything() {
        let v = StaticTokenVerifier::new("");
        assert!(!v.verify(""));
        assert!(!v.verify("anything"));
    }
}
