//! Orchestration: one forwarder per service, one merge-printer, and the
//! follow-mode restart loop.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use logweave_core::config::EngineConfig;
use logweave_core::{RawRecord, RunOptions, StreamOptions};
use logweave_feeds::{LifecycleWatch, LogSource, WatchError};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::MuxError;
use crate::forwarder::{forward_logs, send, ForwardError};
use crate::printer::MergePrinter;
use crate::render::Renderer;
use crate::restart::wait_for_restart;

/// Timing and sizing knobs for [`Engine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub window: Duration,
    /// Pause between a stream ending and starting to wait for a restart.
    pub restart_settle: Duration,
    pub queue_per_service: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            window: config.window(),
            restart_settle: config.restart_settle(),
            queue_per_service: config.queue_per_service,
        }
    }
}

/// Streams the logs of several services to one writer.
pub struct Engine {
    source: Arc<dyn LogSource>,
    watch: Arc<dyn LifecycleWatch>,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(source: Arc<dyn LogSource>, watch: Arc<dyn LifecycleWatch>) -> Self {
        Self {
            source,
            watch,
            settings: EngineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Print the merged logs of `services` until every stream is finished,
    /// `cancel` fires, or a stream fails.
    ///
    /// Labels are only shown when there is more than one service. Without
    /// `follow`, each service's stream is read once. With it, a service
    /// whose stream ends is re-attached once its container runs again, and
    /// the run only finishes when no service is streaming or waiting to.
    /// All forwarders have stopped by the time this returns.
    pub async fn run<W: Write>(
        &self,
        services: &[String],
        options: RunOptions,
        mut renderer: Renderer<W>,
        cancel: &CancellationToken,
    ) -> Result<(), MuxError> {
        if services.is_empty() {
            return Err(MuxError::NoServices);
        }
        let cancel = cancel.child_token();
        renderer.show_labels(services.len() > 1);

        let capacity = services.len() * self.settings.queue_per_service.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let liveness = Arc::new(Liveness::new(services.len(), cancel.clone()));

        let mut workers = JoinSet::new();
        for service in services {
            let worker = ServiceWorker {
                service: service.clone(),
                source: Arc::clone(&self.source),
                watch: Arc::clone(&self.watch),
                tx: tx.clone(),
                cancel: cancel.clone(),
                liveness: Arc::clone(&liveness),
                options,
                settle: self.settings.restart_settle,
            };
            workers.spawn(worker.run());
        }
        drop(tx);
        info!(services = services.len(), follow = options.follow, "Streaming logs");

        let result = MergePrinter::new(renderer, self.settings.window, options.follow)
            .run(rx, &cancel)
            .await;

        cancel.cancel();
        workers.shutdown().await;
        result
    }
}

/// Counts services that are streaming or waiting for a restart. Reaching
/// zero cancels the run.
struct Liveness {
    active: AtomicUsize,
    cancel: CancellationToken,
}

impl Liveness {
    fn new(active: usize, cancel: CancellationToken) -> Self {
        Self {
            active: AtomicUsize::new(active),
            cancel,
        }
    }

    fn acquire(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            debug!("No service is streaming any more");
            self.cancel.cancel();
        }
    }
}

struct ServiceWorker {
    service: String,
    source: Arc<dyn LogSource>,
    watch: Arc<dyn LifecycleWatch>,
    tx: mpsc::Sender<RawRecord>,
    cancel: CancellationToken,
    liveness: Arc<Liveness>,
    options: RunOptions,
    settle: Duration,
}

impl ServiceWorker {
    async fn run(self) {
        let mut stream_options = StreamOptions::from(self.options);

        loop {
            let result = forward_logs(
                self.source.as_ref(),
                &self.service,
                &stream_options,
                &self.tx,
                &self.cancel,
            )
            .await;
            let ended_at = Utc::now();

            match result {
                Ok(()) => {}
                Err(ForwardError::Open(err)) => {
                    // The printer turns this into the run's error.
                    let record = RawRecord::failure(self.service.as_str(), Arc::new(err));
                    send(&self.tx, &self.cancel, record).await;
                    self.liveness.release();
                    return;
                }
                Err(ForwardError::Read(_)) => {
                    self.liveness.release();
                    return;
                }
            }
            self.liveness.release();

            if !self.options.follow {
                return;
            }

            tokio::time::sleep(self.settle).await;
            if self.cancel.is_cancelled() {
                return;
            }

            match wait_for_restart(self.watch.as_ref(), &self.service, &self.cancel).await {
                Ok(()) => {}
                Err(WatchError::Cancelled) => {
                    debug!(service = %self.service, "Stopped waiting for restart");
                    return;
                }
                Err(err) => {
                    warn!(service = %self.service, error = %err, "Failed to wait for container to restart");
                    return;
                }
            }

            info!(service = %self.service, "Container restarted, re-attaching");
            self.liveness.acquire();
            stream_options.previous = false;
            stream_options.since = Some(ended_at);
        }
    }
}
