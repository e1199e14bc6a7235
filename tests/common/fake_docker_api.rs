//! Fake Docker Engine API server for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1. Serves:
//! - `GET /containers/{id}/json`: inspect payload of a configured container
//! - `GET /containers/{id}/logs`: the buffered log output, framed the way
//!   the daemon frames it for non-TTY containers
//! - `GET /events`: a stream that stays open and carries one event line per
//!   [`FakeDockerApi::set_status`] call
//!
//! The daemon normally listens on a Unix socket; TCP keeps the fake portable.
//! Point a `DockerClient` at [`FakeDockerApi::host`].

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};

pub const STDOUT: u8 = 1;
pub const STDERR: u8 = 2;

struct Container {
    status: String,
    started_at: String,
    tty: bool,
    output: Vec<(u8, String)>,
}

#[derive(Default)]
struct ApiState {
    containers: HashMap<String, Container>,
    log_queries: Vec<String>,
    subscribers: Vec<mpsc::UnboundedSender<Bytes>>,
}

type Shared = Arc<Mutex<ApiState>>;

/// Handle to the running fake Docker API server.
pub struct FakeDockerApi {
    addr: SocketAddr,
    state: Shared,
}

impl FakeDockerApi {
    /// Start the server on a random port. Returns once it is listening.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state: Shared = Arc::default();

        let app = Router::new()
            .route("/containers/{id}/json", get(inspect))
            .route("/containers/{id}/logs", get(logs))
            .route("/events", get(events))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self { addr, state })
    }

    /// `DOCKER_HOST`-style address of the server.
    pub fn host(&self) -> String {
        format!("tcp://{}", self.addr)
    }

    /// Register a container. `started_at` of `0001-01-01T00:00:00Z` means it
    /// never ran.
    pub async fn add_container(&self, name: &str, status: &str, started_at: &str) {
        self.state.lock().await.containers.insert(
            name.to_string(),
            Container {
                status: status.to_string(),
                started_at: started_at.to_string(),
                tty: false,
                output: Vec::new(),
            },
        );
    }

    pub async fn set_tty(&self, name: &str, tty: bool) {
        if let Some(container) = self.state.lock().await.containers.get_mut(name) {
            container.tty = tty;
        }
    }

    /// Append output on `stream` ([`STDOUT`] or [`STDERR`]). Each call
    /// becomes one frame.
    pub async fn push_output(&self, name: &str, stream: u8, text: &str) {
        if let Some(container) = self.state.lock().await.containers.get_mut(name) {
            container.output.push((stream, text.to_string()));
        }
    }

    /// Change a container's status and announce it on every open event
    /// stream.
    pub async fn set_status(&self, name: &str, status: &str) {
        let mut state = self.state.lock().await;
        if let Some(container) = state.containers.get_mut(name) {
            container.status = status.to_string();
        }
        let event = serde_json::json!({
            "Type": "container",
            "Action": status,
            "Actor": { "ID": name },
        });
        let line = Bytes::from(format!("{event}\n"));
        state
            .subscribers
            .retain(|subscriber| subscriber.send(line.clone()).is_ok());
    }

    /// Query strings of every `/logs` request so far.
    pub async fn log_queries(&self) -> Vec<String> {
        self.state.lock().await.log_queries.clone()
    }

    pub async fn subscriber_count(&self) -> usize {
        self.state.lock().await.subscribers.len()
    }
}

/// Docker's multiplexed stream framing: `[stream, 0, 0, 0, len_be_u32]`.
pub fn frame(stream: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![stream, 0, 0, 0];
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

fn no_such_container(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "message": format!("No such container: {id}") })),
    )
        .into_response()
}

async fn inspect(Path(id): Path<String>, State(state): State<Shared>) -> Response {
    let state = state.lock().await;
    let Some(container) = state.containers.get(&id) else {
        return no_such_container(&id);
    };
    Json(serde_json::json!({
        "Name": format!("/{id}"),
        "State": {
            "Status": container.status,
            "Running": container.status == "running",
            "StartedAt": container.started_at,
        },
        "Config": { "Tty": container.tty },
    }))
    .into_response()
}

async fn logs(
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    State(state): State<Shared>,
) -> Response {
    let mut state = state.lock().await;
    state.log_queries.push(query.unwrap_or_default());
    let Some(container) = state.containers.get(&id) else {
        return no_such_container(&id);
    };

    let mut body = Vec::new();
    for (stream, text) in &container.output {
        if container.tty {
            body.extend_from_slice(text.as_bytes());
        } else {
            body.extend_from_slice(&frame(*stream, text.as_bytes()));
        }
    }
    (StatusCode::OK, body).into_response()
}

async fn events(State(state): State<Shared>) -> Response {
    let (tx, rx) = mpsc::unbounded_channel::<Bytes>();
    state.lock().await.subscribers.push(tx);

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|line| (Ok::<_, Infallible>(line), rx))
    });
    Body::from_stream(stream).into_response()
}
