//! logweave-feeds: the collaborators the engine reads logs through.
//!
//! The engine never talks to a container runtime directly. It opens byte
//! streams through a [`LogSource`], waits for replacement instances through a
//! [`LifecycleWatch`] and relies on a [`StartCheck`] having passed before it
//! starts. [`docker::DockerClient`] implements all three against the Docker
//! Engine API.

use async_trait::async_trait;
use logweave_core::StreamOptions;
use tokio_util::sync::CancellationToken;

pub mod docker;
mod error;
mod lines;

pub use error::{SourceError, WatchError};
pub use lines::LineSplitter;

/// Result of one [`LogStream::read_line`] call.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A complete line without its trailing newline.
    Line(String),
    /// The remote end closed the stream. Carries a final line that was not
    /// newline-terminated, if any. Every later read also returns `Ended`.
    Ended(Option<String>),
    /// The stream broke.
    Failed(SourceError),
}

/// One open, newline-delimited log stream.
///
/// Dropping the stream releases the underlying connection immediately.
#[async_trait]
pub trait LogStream: Send {
    async fn read_line(&mut self) -> ReadOutcome;
}

/// Opens log streams for services.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Open a stream for `service`. Every line must start with the time it
    /// was generated, as `<RFC3339Nano><space><message>`.
    async fn open(
        &self,
        service: &str,
        options: &StreamOptions,
    ) -> Result<Box<dyn LogStream>, SourceError>;
}

/// Lifecycle phase of the instance currently backing a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    /// The service has no instance right now.
    Missing,
    Unknown,
}

impl Phase {
    /// Map a Docker `State.Status` string.
    pub fn from_status(status: &str) -> Self {
        match status {
            "created" => Phase::Created,
            "running" => Phase::Running,
            "paused" => Phase::Paused,
            "restarting" => Phase::Restarting,
            "removing" => Phase::Removing,
            "exited" => Phase::Exited,
            "dead" => Phase::Dead,
            _ => Phase::Unknown,
        }
    }
}

/// Predicate over a service's phase, evaluated by a [`LifecycleWatch`].
pub type PhasePredicate = dyn Fn(Phase) -> bool + Send + Sync;

/// Watches a service's lifecycle.
#[async_trait]
pub trait LifecycleWatch: Send + Sync {
    /// Resolve once `predicate` holds for `service`.
    ///
    /// Returns [`WatchError::Cancelled`] as soon as `cancel` fires.
    async fn wait_until(
        &self,
        service: &str,
        predicate: &PhasePredicate,
        cancel: &CancellationToken,
    ) -> Result<(), WatchError>;
}

/// Checked for every service before the engine starts: logs only exist for
/// containers that have started at least once.
#[async_trait]
pub trait StartCheck: Send + Sync {
    async fn has_ever_started(&self, service: &str) -> Result<bool, SourceError>;
}
