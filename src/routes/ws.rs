// WebSocket handlers: token check and target validation happen before the
// upgrade (the Connecting phase); after accept, the session loop owns the
// connection until a terminal state.

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::time::{Duration, timeout};
use tracing::{debug, info};

use super::AppState;
use crate::session::{self, RecordSink, SessionState, SinkClosed, StreamKind, close_code};

#[derive(Deserialize)]
pub(super) struct WsAuthParams {
    #[serde(default)]
    token: String,
}

pub(super) async fn ws_logs(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(container_id): Path<String>,
    Query(params): Query<WsAuthParams>,
) -> Response {
    upgrade_session(ws, state, params, StreamKind::Logs, Some(container_id)).await
}

pub(super) async fn ws_events(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsAuthParams>,
) -> Response {
    upgrade_session(ws, state, params, StreamKind::Events, None).await
}

pub(super) async fn ws_stats(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(container_id): Path<String>,
    Query(params): Query<WsAuthParams>,
) -> Response {
    upgrade_session(ws, state, params, StreamKind::Stats, Some(container_id)).await
}

async fn upgrade_session(
    ws: WebSocketUpgrade,
    state: AppState,
    params: WsAuthParams,
    kind: StreamKind,
    container_id: Option<String>,
) -> Response {
    debug!(?kind, state = ?SessionState::Connecting, "validating stream request");
    if !state.verifier.verify(&params.token) {
        return (
            StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({ "detail": "Invalid token" })),
        )
            .into_response();
    }
    // Unknown targets fail here with a proper status, not mid-stream.
    if let Some(id) = container_id.as_deref() {
        if let Err(e) = state.service.client().inspect_container(id).await {
            return e.into_response();
        }
    }
    ws.on_upgrade(move |socket| run_ws_session(socket, state, kind, container_id))
}

async fn run_ws_session(
    socket: WebSocket,
    state: AppState,
    kind: StreamKind,
    container_id: Option<String>,
) {
    let streaming = &state.config.streaming;
    let capacity = streaming.channel_capacity;
    let send_timeout = Duration::from_secs(streaming.send_timeout_secs);
    let ping_interval = Duration::from_secs(streaming.ping_interval_secs);
    let target = container_id.as_deref().unwrap_or("daemon").to_string();

    let (sender, mut receiver) = socket.split();
    let mut sink = WsSink {
        sender,
        send_timeout,
    };

    let client = state.service.client();
    let source = match (kind, container_id.as_deref()) {
        (StreamKind::Logs, Some(id)) => {
            client
                .open_log_stream(id, state.config.logs.default_tail, capacity)
                .await
        }
        (StreamKind::Stats, Some(id)) => client.open_stats_stream(id, capacity).await,
        (StreamKind::Events, _) => client.open_event_stream(capacity).await,
        // Container-bound kinds are only routed with a path id.
        _ => return,
    };

    let source = match source {
        Ok(source) => source,
        Err(e) => {
            let _ = sink.send(format!("Error: {e}")).await;
            sink.close(close_code::ERROR, "stream open failed").await;
            return;
        }
    };

    info!(?kind, target = %target, "stream session accepted");
    let disconnect = async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                _ => {}
            }
        }
    };
    let outcome = session::run(source, kind, &mut sink, disconnect, ping_interval).await;
    info!(
        ?kind,
        target = %target,
        state = ?outcome.state,
        pushed = outcome.pushed,
        failed = outcome.failed,
        "stream session ended"
    );
}

struct WsSink {
    sender: SplitSink<WebSocket, Message>,
    send_timeout: Duration,
}

impl RecordSink for WsSink {
    async fn send(&mut self, record: String) -> Result<(), SinkClosed> {
        match timeout(self.send_timeout, self.sender.send(Message::Text(record.into()))).await {
            Ok(Ok(())) => Ok(()),
            _ => Err(SinkClosed),
        }
    }

    async fn ping(&mut self) -> Result<(), SinkClosed> {
        match timeout(self.send_timeout, self.sender.send(Message::Ping(Bytes::new()))).await {
            Ok(Ok(())) => Ok(()),
            _ => Err(SinkClosed),
        }
    }

    async fn close(&mut self, code: u16, reason: &str) {
        let frame = CloseFrame {
            code,
            reason: reason.to_string().into(),
        };
        let _ = timeout(
            self.send_timeout,
            self.sender.send(Message::Close(Some(frame))),
        )
        .await;
    }
}
