use thiserror::Error;

/// Failures talking to a log source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid docker host {0:?}")]
    InvalidHost(String),
    #[error("connect to docker daemon at {addr}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("docker request failed")]
    Http(#[from] hyper::Error),
    #[error("build docker request")]
    Request(#[from] hyper::http::Error),
    #[error("no such container: {0}")]
    NotFound(String),
    #[error("docker api returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("decode docker response")]
    Decode(#[from] serde_json::Error),
    #[error("malformed log frame: {0}")]
    Frame(String),
}

/// Why a [`LifecycleWatch`](crate::LifecycleWatch) stopped without the
/// predicate holding.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("wait cancelled")]
    Cancelled,
    #[error("lifecycle watch closed before the condition was met")]
    Closed,
    #[error(transparent)]
    Failed(#[from] SourceError),
}
