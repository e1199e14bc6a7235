//! Copies one service's log stream onto the shared queue.

use std::sync::Arc;

use logweave_core::{RawRecord, StreamOptions};
use logweave_feeds::{LogSource, ReadOutcome, SourceError};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum ForwardError {
    /// The stream could not be opened. Nothing was sent on the queue.
    #[error("start logs stream")]
    Open(#[source] SourceError),
    /// The stream broke mid-read. A [`RawRecord::Failure`] carrying the same
    /// error has already been queued.
    #[error("read logs stream")]
    Read(#[source] Arc<SourceError>),
}

/// Forward every line of one run of `service`'s stream to `tx`.
///
/// Returns `Ok(())` once the stream ends (after queueing a
/// [`RawRecord::Terminal`]), when cancellation is observed between reads, or
/// when the queue is gone. The stream is dropped, and with it the
/// connection, on every return path.
pub async fn forward_logs(
    source: &dyn LogSource,
    service: &str,
    options: &StreamOptions,
    tx: &mpsc::Sender<RawRecord>,
    cancel: &CancellationToken,
) -> Result<(), ForwardError> {
    let mut stream = source
        .open(service, options)
        .await
        .map_err(ForwardError::Open)?;
    debug!(service, "log stream opened");

    loop {
        if cancel.is_cancelled() {
            return Ok(());
        }

        match stream.read_line().await {
            ReadOutcome::Line(text) => {
                trace!(service, %text, "line");
                if !send(tx, cancel, RawRecord::data(service, text)).await {
                    return Ok(());
                }
            }
            ReadOutcome::Ended(trailing) => {
                debug!(service, "log stream ended");
                send(tx, cancel, RawRecord::terminal(service, trailing)).await;
                return Ok(());
            }
            ReadOutcome::Failed(err) => {
                let err = Arc::new(err);
                send(tx, cancel, RawRecord::failure(service, err.clone())).await;
                return Err(ForwardError::Read(err));
            }
        }
    }
}

/// Enqueue `record` unless cancellation fires first. A full queue must not
/// keep a forwarder alive after shutdown.
pub(crate) async fn send(
    tx: &mpsc::Sender<RawRecord>,
    cancel: &CancellationToken,
    record: RawRecord,
) -> bool {
    tokio::select! {
        sent = tx.send(record) => sent.is_ok(),
        _ = cancel.cancelled() => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
