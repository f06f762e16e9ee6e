// Streaming session state machine: one cancellable pull loop per duplex
// connection, normalizing stats ticks and pushing one text record per item.

use crate::docker::{StreamPayload, StreamSource};
use crate::stats::{self, CpuSample};
use tokio::time::{Duration, interval};
use tracing::{debug, warn};

/// WebSocket close codes used by sessions.
pub mod close_code {
    pub const NORMAL: u16 = 1000;
    pub const ERROR: u16 = 1011;
}

/// What a session streams; only `Stats` goes through the normalizer,
/// logs and events pass through as opaque text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Logs,
    Events,
    Stats,
}

/// Session lifecycle. `Connecting` covers target/token validation before the
/// channel is accepted; the run loop starts at `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    /// Consumer went away; pulling stopped, source released unread.
    Draining,
    /// Producer finished (gracefully or with an error).
    Closed,
}

/// The consumer side of a session. Implemented over a WebSocket in the
/// routes; tests use an in-memory sink.
pub trait RecordSink {
    /// Push one self-contained text record. An error means the consumer is
    /// gone (or as good as gone: a stalled send that timed out).
    fn send(
        &mut self,
        record: String,
    ) -> impl std::future::Future<Output = Result<(), SinkClosed>> + Send;

    /// Keepalive so consumer disconnect is observed on idle streams.
    fn ping(&mut self) -> impl std::future::Future<Output = Result<(), SinkClosed>> + Send;

    /// Best-effort close frame; failures are swallowed by the caller.
    fn close(
        &mut self,
        code: u16,
        reason: &str,
    ) -> impl std::future::Future<Output = ()> + Send;
}

/// Marker error: the consumer end of the sink no longer accepts records.
#[derive(Debug)]
pub struct SinkClosed;

/// How a finished session ended.
#[derive(Debug)]
pub struct SessionOutcome {
    pub state: SessionState,
    /// Records pushed to the consumer (error records excluded).
    pub pushed: u64,
    /// True when the producer raised mid-stream.
    pub failed: bool,
}

/// Drive one session to its terminal state.
///
/// Per iteration: wait for the next raw item or for consumer disconnect.
/// Consumer disconnect (signal future, failed push, failed ping) moves to
/// Draining and stops pulling. Producer exhaustion closes gracefully.
/// A producer error pushes one best-effort "Error: ..." record, then closes
/// abnormally. Every path releases the source exactly once. No per-item
/// timeout is imposed: a stalled daemon stream stalls the session.
pub async fn run<S: RecordSink>(
    mut source: StreamSource,
    kind: StreamKind,
    sink: &mut S,
    disconnect: impl Future<Output = ()>,
    ping_interval: Duration,
) -> SessionOutcome {
    tokio::pin!(disconnect);
    let mut ping_tick = interval(ping_interval);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ping_tick.reset(); // the first tick fires immediately otherwise

    let mut state = SessionState::Active;
    let mut pushed = 0u64;
    let mut failed = false;
    let mut prev_cpu: Option<CpuSample> = None;
    debug!(?kind, "session active");

    loop {
        tokio::select! {
            _ = &mut disconnect => {
                state = SessionState::Draining;
                break;
            }
            _ = ping_tick.tick() => {
                if sink.ping().await.is_err() {
                    state = SessionState::Draining;
                    break;
                }
            }
            item = source.next() => match item {
                None => {
                    // Daemon closed the stream: a normal end, not an error.
                    state = SessionState::Closed;
                    sink.close(close_code::NORMAL, "stream ended").await;
                    break;
                }
                Some(Ok(payload)) => {
                    let record = match payload {
                        StreamPayload::Text(text) => text,
                        StreamPayload::Stats(s) => {
                            let (tick, sample) = stats::normalize_tick(&s, prev_cpu.as_ref());
                            if let Some(sample) = sample {
                                prev_cpu = Some(sample);
                            }
                            match serde_json::to_string(&tick) {
                                Ok(json) => json,
                                Err(e) => {
                                    warn!(error = %e, "skipping unserializable stats tick");
                                    continue;
                                }
                            }
                        }
                    };
                    if sink.send(record).await.is_err() {
                        state = SessionState::Draining;
                        break;
                    }
                    pushed += 1;
                }
                Some(Err(e)) => {
                    // Terminal for this sequence; tell the consumer if it is
                    // still there, then close abnormally.
                    failed = true;
                    let _ = sink.send(format!("Error: {e}")).await;
                    sink.close(close_code::ERROR, "stream failed").await;
                    state = SessionState::Closed;
                    break;
                }
            }
        }
    }

    source.release();
    SessionOutcome {
        state,
        pushed,
        failed,
    }
}
