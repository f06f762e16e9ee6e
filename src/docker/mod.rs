// Docker daemon adapter via bollard: one shared lazily-created handle,
// one-shot fetches, and producer-backed continuous sources.

use crate::error::GatewayError;
use bollard::Docker;
use bollard::query_parameters::{
    EventsOptions, InspectContainerOptions, ListContainersOptions, ListImagesOptions,
    LogsOptionsBuilder, StatsOptions,
};
use bollard::models::{
    ContainerInspectResponse, ContainerStatsResponse, ContainerSummary, EventMessage,
    ImageSummary, SystemInfo, SystemVersion,
};
use futures_util::StreamExt;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

/// One unit pulled from a continuous source. Logs and events are opaque
/// text; stats carry the raw response for the normalizer.
#[derive(Debug)]
pub enum StreamPayload {
    Text(String),
    Stats(Box<ContainerStatsResponse>),
}

/// Pull-based, potentially infinite, non-restartable sequence of raw items.
/// A producer task pulls the daemon stream and feeds a bounded channel; the
/// channel provides backpressure and keeps the consumer side cancellable.
/// After an `Err` item the sequence is terminal and must be discarded.
pub struct StreamSource {
    rx: mpsc::Receiver<Result<StreamPayload, GatewayError>>,
    producer: tokio::task::JoinHandle<()>,
}

impl StreamSource {
    pub fn new(
        rx: mpsc::Receiver<Result<StreamPayload, GatewayError>>,
        producer: tokio::task::JoinHandle<()>,
    ) -> Self {
        Self { rx, producer }
    }

    /// Next raw item; `None` means the daemon closed the stream.
    pub async fn next(&mut self) -> Option<Result<StreamPayload, GatewayError>> {
        self.rx.recv().await
    }

    /// Stop the producer and drop the channel. Consumes the source so a
    /// session cannot release twice or keep pulling after release. If a
    /// session future is dropped without calling this, the producer exits on
    /// its next send into the closed channel.
    pub fn release(self) {
        self.producer.abort();
    }
}

/// Shared client for the container runtime daemon. The handle is created on
/// first use (or by an explicit startup [`connect`](Self::connect)) and
/// replaced atomically on reconnect; at most one lives at a time.
pub struct DockerClient {
    inner: RwLock<Option<Docker>>,
}

impl Default for DockerClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerClient {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Idempotent: creates the handle only if absent and probes the daemon.
    /// On failure the shared slot stays unset so a later call retries.
    pub async fn connect(&self) -> Result<(), GatewayError> {
        let mut guard = self.inner.write().await;
        if let Some(docker) = guard.as_ref() {
            if docker.ping().await.is_ok() {
                return Ok(());
            }
            // Stale handle; replace it under the same lock.
            *guard = None;
        }
        let docker = Docker::connect_with_unix_defaults().map_err(|e| {
            warn!(error = %e, "Docker socket connect failed");
            GatewayError::DaemonUnavailable
        })?;
        docker.ping().await.map_err(|e| {
            warn!(error = %e, "Docker ping failed");
            GatewayError::DaemonUnavailable
        })?;
        *guard = Some(docker);
        Ok(())
    }

    /// Releases the handle, returning the client to uninitialized.
    pub async fn close(&self) {
        let mut guard = self.inner.write().await;
        if guard.take().is_some() {
            debug!("Docker handle released");
        }
    }

    /// Fresh liveness probe; never errors.
    pub async fn is_connected(&self) -> bool {
        match self.handle().await {
            Ok(docker) => docker.ping().await.is_ok(),
            Err(_) => false,
        }
    }

    async fn handle(&self) -> Result<Docker, GatewayError> {
        if let Some(docker) = self.inner.read().await.as_ref() {
            return Ok(docker.clone());
        }
        self.connect().await?;
        self.inner
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(GatewayError::DaemonUnavailable)
    }

    pub async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, GatewayError> {
        let docker = self.handle().await?;
        let options = ListContainersOptions {
            all,
            ..Default::default()
        };
        Ok(docker.list_containers(Some(options)).await?)
    }

    pub async fn inspect_container(
        &self,
        container_id: &str,
    ) -> Result<ContainerInspectResponse, GatewayError> {
        let docker = self.handle().await?;
        Ok(docker
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await?)
    }

    /// Single stats poll. The response bundles the previous cycle's counters
    /// (`precpu_stats`), so one poll suffices for a CPU delta.
    pub async fn stats_once(
        &self,
        container_id: &str,
    ) -> Result<ContainerStatsResponse, GatewayError> {
        let docker = self.handle().await?;
        let options = StatsOptions {
            stream: false,
            ..Default::default()
        };
        let mut stream = docker.stats(container_id, Some(options));
        match stream.next().await {
            Some(Ok(s)) => Ok(s),
            Some(Err(e)) => Err(e.into()),
            None => Err(GatewayError::DaemonError("empty stats response".into())),
        }
    }

    pub async fn collect_logs(
        &self,
        container_id: &str,
        tail: u32,
    ) -> Result<String, GatewayError> {
        let docker = self.handle().await?;
        let options = LogsOptionsBuilder::default()
            .stdout(true)
            .stderr(true)
            .tail(&tail.to_string())
            .build();
        let mut stream = docker.logs(container_id, Some(options));
        let mut lines = String::new();
        while let Some(item) = stream.next().await {
            let output = item?;
            lines.push_str(&String::from_utf8_lossy(&output.into_bytes()));
        }
        Ok(lines)
    }

    pub async fn list_images(&self) -> Result<Vec<ImageSummary>, GatewayError> {
        let docker = self.handle().await?;
        Ok(docker
            .list_images(Some(ListImagesOptions::default()))
            .await?)
    }

    pub async fn version(&self) -> Result<SystemVersion, GatewayError> {
        let docker = self.handle().await?;
        Ok(docker.version().await?)
    }

    pub async fn info(&self) -> Result<SystemInfo, GatewayError> {
        let docker = self.handle().await?;
        Ok(docker.info().await?)
    }

    /// Follow a container's log output. Validates the target first, so a
    /// missing container fails here rather than as a mid-stream error.
    pub async fn open_log_stream(
        &self,
        container_id: &str,
        tail: u32,
        capacity: usize,
    ) -> Result<StreamSource, GatewayError> {
        let docker = self.handle().await?;
        docker
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await?;
        let options = LogsOptionsBuilder::default()
            .stdout(true)
            .stderr(true)
            .follow(true)
            .tail(&tail.to_string())
            .build();
        let id = container_id.to_string();
        let (tx, rx) = mpsc::channel(capacity);
        let producer = tokio::spawn(async move {
            let mut stream = docker.logs(&id, Some(options));
            while let Some(item) = stream.next().await {
                match item {
                    Ok(output) => {
                        let line = String::from_utf8_lossy(&output.into_bytes())
                            .trim_end()
                            .to_string();
                        if tx.send(Ok(StreamPayload::Text(line))).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e.into())).await;
                        break;
                    }
                }
            }
        });
        Ok(StreamSource::new(rx, producer))
    }

    /// Follow daemon lifecycle events (whole-daemon target).
    pub async fn open_event_stream(&self, capacity: usize) -> Result<StreamSource, GatewayError> {
        let docker = self.handle().await?;
        let (tx, rx) = mpsc::channel(capacity);
        let producer = tokio::spawn(async move {
            let mut stream = docker.events(None::<EventsOptions>);
            while let Some(item) = stream.next().await {
                match item {
                    Ok(event) => match serde_json::to_string::<EventMessage>(&event) {
                        Ok(json) => {
                            if tx.send(Ok(StreamPayload::Text(json))).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "skipping unserializable daemon event");
                        }
                    },
                    Err(e) => {
                        let _ = tx.send(Err(e.into())).await;
                        break;
                    }
                }
            }
        });
        Ok(StreamSource::new(rx, producer))
    }

    /// Follow a container's raw stats snapshots, one per daemon cycle.
    pub async fn open_stats_stream(
        &self,
        container_id: &str,
        capacity: usize,
    ) -> Result<StreamSource, GatewayError> {
        let docker = self.handle().await?;
        docker
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await?;
        let options = StatsOptions {
            stream: true,
            ..Default::default()
        };
        let id = container_id.to_string();
        let (tx, rx) = mpsc::channel(capacity);
        let producer = tokio::spawn(async move {
            let mut stream = docker.stats(&id, Some(options));
            while let Some(item) = stream.next().await {
                match item {
                    Ok(s) => {
                        if tx
                            .send(Ok(StreamPayload::Stats(Box::new(s))))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e.into())).await;
                        break;
                    }
                }
            }
        });
        Ok(StreamSource::new(rx, producer))
    }
}
