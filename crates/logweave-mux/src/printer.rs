//! The windowed merge-printer.

use std::io::Write;
use std::time::Duration;

use logweave_core::RawRecord;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::MuxError;
use crate::render::Renderer;
use crate::window::flush_window;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Accumulating,
    Draining,
    Closed,
}

/// Consumes the shared queue and prints records in timestamp order.
///
/// The first record of a window arms a timer; when it fires, everything
/// received in the meantime is sorted and written. Records never wait longer
/// than one window.
pub struct MergePrinter<W> {
    renderer: Renderer<W>,
    window: Duration,
    follow: bool,
}

impl<W: Write> MergePrinter<W> {
    pub fn new(renderer: Renderer<W>, window: Duration, follow: bool) -> Self {
        Self {
            renderer,
            window,
            follow,
        }
    }

    /// Print until the queue closes or `cancel` fires.
    ///
    /// On cancellation, whatever is already queued is drained and printed
    /// before returning. A failure record flushes the current window and is
    /// returned as [`MuxError::Read`], also when found while draining.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<RawRecord>,
        cancel: &CancellationToken,
    ) -> Result<(), MuxError> {
        let mut window: Vec<RawRecord> = Vec::new();
        let mut flush_scheduled = false;
        let timer = time::sleep(self.window);
        tokio::pin!(timer);

        let mut state = State::Accumulating;
        while state == State::Accumulating {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => state = State::Draining,

                () = &mut timer, if flush_scheduled => {
                    flush_scheduled = false;
                    self.flush(&mut window)?;
                }

                record = rx.recv() => match record {
                    None => {
                        self.flush(&mut window)?;
                        state = State::Closed;
                    }
                    Some(RawRecord::Failure { service, error }) => {
                        self.flush(&mut window)?;
                        return Err(MuxError::Read { service, source: error });
                    }
                    Some(record) => {
                        window.push(record);
                        if !flush_scheduled {
                            timer.as_mut().reset(Instant::now() + self.window);
                            flush_scheduled = true;
                        }
                    }
                },
            }
        }

        if state == State::Draining {
            // A failure can be queued just before the last forwarder stops.
            let mut failure = None;
            while let Ok(record) = rx.try_recv() {
                match record {
                    RawRecord::Failure { service, error } => {
                        failure.get_or_insert(MuxError::Read {
                            service,
                            source: error,
                        });
                    }
                    record => window.push(record),
                }
            }
            debug!(records = window.len(), "Draining queue after cancellation");
            self.flush(&mut window)?;
            if let Some(err) = failure {
                return Err(err);
            }
        }
        Ok(())
    }

    fn flush(&mut self, window: &mut Vec<RawRecord>) -> Result<(), MuxError> {
        flush_window(window, self.follow, &mut self.renderer)?;
        Ok(())
    }
}
