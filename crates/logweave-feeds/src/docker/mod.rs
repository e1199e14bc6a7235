//! Docker Engine API client.
//!
//! Speaks HTTP/1.1 to the daemon over its Unix socket (`unix:///var/run/docker.sock`)
//! or TCP (`tcp://host:port`). Each request gets its own connection; the
//! connection task lives exactly as long as the response body it serves, so
//! dropping a log stream closes the socket.

mod lifecycle;
mod logs;

pub use logs::{DockerLogStream, FrameDecoder};

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper::{header, Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{Phase, SourceError, StartCheck};

/// `State.StartedAt` of a container that has never run.
const ZERO_TIME_PREFIX: &str = "0001-01-01";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    Unix(PathBuf),
    Tcp(String),
}

/// Client for one Docker daemon. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DockerClient {
    endpoint: Endpoint,
}

impl DockerClient {
    /// Parse a `DOCKER_HOST`-style address.
    pub fn new(host: &str) -> Result<Self, SourceError> {
        let endpoint = if let Some(path) = host.strip_prefix("unix://") {
            Endpoint::Unix(PathBuf::from(path))
        } else if let Some(addr) = host
            .strip_prefix("tcp://")
            .or_else(|| host.strip_prefix("http://"))
        {
            Endpoint::Tcp(addr.trim_end_matches('/').to_string())
        } else {
            return Err(SourceError::InvalidHost(host.to_string()));
        };

        match &endpoint {
            Endpoint::Unix(path) if path.as_os_str().is_empty() => {
                Err(SourceError::InvalidHost(host.to_string()))
            }
            Endpoint::Tcp(addr) if addr.is_empty() => {
                Err(SourceError::InvalidHost(host.to_string()))
            }
            _ => Ok(Self { endpoint }),
        }
    }

    /// Inspect a container by name or id.
    pub async fn inspect(&self, container: &str) -> Result<ContainerInspect, SourceError> {
        let path = format!("/containers/{}/json", urlencoding::encode(container));
        self.get_json(&path, container).await
    }

    /// Current phase of a container; [`Phase::Missing`] if it does not exist.
    pub async fn phase(&self, container: &str) -> Result<Phase, SourceError> {
        match self.inspect(container).await {
            Ok(inspect) => Ok(inspect.state.phase()),
            Err(SourceError::NotFound(_)) => Ok(Phase::Missing),
            Err(err) => Err(err),
        }
    }

    /// Issue a `GET` and return the response body once the status is known
    /// to be successful. `subject` names the container for 404 errors.
    pub(crate) async fn get(&self, path: &str, subject: &str) -> Result<Exchange, SourceError> {
        let (mut sender, connection) = self.connect().await?;
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::HOST, self.host_header())
            .body(Empty::<Bytes>::new())?;

        let response = sender.send_request(request).await?;
        let (parts, body) = response.into_parts();
        if parts.status.is_success() {
            return Ok(Exchange {
                body,
                _connection: connection,
            });
        }
        if parts.status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(subject.to_string()));
        }

        let bytes = body.collect().await?.to_bytes();
        let message = serde_json::from_slice::<ApiMessage>(&bytes)
            .map(|m| m.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).trim().to_string());
        Err(SourceError::Status {
            status: parts.status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        subject: &str,
    ) -> Result<T, SourceError> {
        let exchange = self.get(path, subject).await?;
        let bytes = exchange.body.collect().await?.to_bytes();
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn connect(&self) -> Result<(http1::SendRequest<Empty<Bytes>>, Connection), SourceError> {
        match &self.endpoint {
            Endpoint::Tcp(addr) => {
                let stream = tokio::net::TcpStream::connect(addr)
                    .await
                    .map_err(|source| SourceError::Connect {
                        addr: addr.clone(),
                        source,
                    })?;
                handshake(stream).await
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                let stream = tokio::net::UnixStream::connect(path)
                    .await
                    .map_err(|source| SourceError::Connect {
                        addr: path.display().to_string(),
                        source,
                    })?;
                handshake(stream).await
            }
            #[cfg(not(unix))]
            Endpoint::Unix(path) => Err(SourceError::InvalidHost(format!(
                "unix://{}",
                path.display()
            ))),
        }
    }

    fn host_header(&self) -> &str {
        match &self.endpoint {
            Endpoint::Tcp(addr) => addr,
            Endpoint::Unix(_) => "docker",
        }
    }
}

#[async_trait]
impl StartCheck for DockerClient {
    async fn has_ever_started(&self, service: &str) -> Result<bool, SourceError> {
        Ok(self.inspect(service).await?.state.has_started())
    }
}

async fn handshake<S>(io: S) -> Result<(http1::SendRequest<Empty<Bytes>>, Connection), SourceError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sender, conn) = http1::handshake(TokioIo::new(io)).await?;
    let task = tokio::spawn(async move {
        if let Err(err) = conn.await {
            debug!(error = %err, "docker connection closed");
        }
    });
    Ok((sender, Connection(task)))
}

/// Aborts the connection task when dropped.
struct Connection(JoinHandle<()>);

impl Drop for Connection {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A successful response whose body is still being read.
pub(crate) struct Exchange {
    pub(crate) body: Incoming,
    _connection: Connection,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

// ---------------------------------------------------------------------------
// Inspect payload (only the fields logweave reads)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInspect {
    #[serde(default)]
    pub state: ContainerState,
    #[serde(default)]
    pub config: ContainerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerState {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub started_at: String,
}

impl ContainerState {
    pub fn phase(&self) -> Phase {
        Phase::from_status(&self.status)
    }

    pub fn has_started(&self) -> bool {
        !self.started_at.is_empty() && !self.started_at.starts_with(ZERO_TIME_PREFIX)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        if !self.has_started() {
            return None;
        }
        DateTime::parse_from_rfc3339(&self.started_at)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    /// TTY containers stream raw bytes instead of multiplexed frames.
    #[serde(default)]
    pub tty: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
