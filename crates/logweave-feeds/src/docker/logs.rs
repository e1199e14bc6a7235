//! `GET /containers/{id}/logs` as a [`LogStream`].

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use http_body_util::BodyExt;
use logweave_core::StreamOptions;
use tracing::debug;

use super::{ContainerState, DockerClient, Exchange};
use crate::{LineSplitter, LogSource, LogStream, ReadOutcome, SourceError};

/// `[stream, 0, 0, 0, len_be_u32]`
const HEADER_LEN: usize = 8;

/// Decodes the stdout/stderr multiplexing Docker applies to the log output of
/// containers started without a TTY.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    /// Feed raw body bytes; complete frame payloads are appended to `out`.
    pub fn decode(&mut self, chunk: &[u8], out: &mut LineSplitter) -> Result<(), SourceError> {
        self.buf.extend_from_slice(chunk);
        while self.buf.len() >= HEADER_LEN {
            let stream = self.buf[0];
            if stream > 2 {
                return Err(SourceError::Frame(format!("unknown stream type {stream}")));
            }
            let len = u32::from_be_bytes([self.buf[4], self.buf[5], self.buf[6], self.buf[7]]) as usize;
            if self.buf.len() < HEADER_LEN + len {
                break;
            }
            self.buf.advance(HEADER_LEN);
            let payload = self.buf.split_to(len);
            out.push(&payload);
        }
        Ok(())
    }

    /// True when no partial frame is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// A live Docker log stream. Dropping it closes the connection.
pub struct DockerLogStream {
    exchange: Exchange,
    frames: Option<FrameDecoder>,
    lines: LineSplitter,
    ended: bool,
}

impl DockerLogStream {
    pub(crate) fn new(exchange: Exchange, tty: bool) -> Self {
        Self {
            exchange,
            frames: (!tty).then(FrameDecoder::default),
            lines: LineSplitter::default(),
            ended: false,
        }
    }
}

#[async_trait]
impl LogStream for DockerLogStream {
    async fn read_line(&mut self) -> ReadOutcome {
        loop {
            if let Some(line) = self.lines.next_line() {
                return ReadOutcome::Line(line);
            }
            if self.ended {
                return ReadOutcome::Ended(self.lines.take_rest());
            }

            match self.exchange.body.frame().await {
                Some(Ok(frame)) => {
                    let Ok(data) = frame.into_data() else {
                        continue;
                    };
                    match &mut self.frames {
                        Some(frames) => {
                            if let Err(err) = frames.decode(&data, &mut self.lines) {
                                return ReadOutcome::Failed(err);
                            }
                        }
                        None => self.lines.push(&data),
                    }
                }
                Some(Err(err)) => return ReadOutcome::Failed(err.into()),
                None => {
                    if self.frames.as_ref().is_some_and(|frames| !frames.is_empty()) {
                        return ReadOutcome::Failed(SourceError::Frame(
                            "stream ended inside a frame".to_string(),
                        ));
                    }
                    self.ended = true;
                }
            }
        }
    }
}

#[async_trait]
impl LogSource for DockerClient {
    async fn open(
        &self,
        service: &str,
        options: &StreamOptions,
    ) -> Result<Box<dyn LogStream>, SourceError> {
        let inspect = self.inspect(service).await?;
        let path = logs_path(service, options, &inspect.state);
        debug!(service, %path, tty = inspect.config.tty, "opening docker log stream");
        let exchange = self.get(&path, service).await?;
        Ok(Box::new(DockerLogStream::new(exchange, inspect.config.tty)))
    }
}

fn logs_path(service: &str, options: &StreamOptions, state: &ContainerState) -> String {
    let mut path = format!(
        "/containers/{}/logs?stdout=1&stderr=1&timestamps=1",
        urlencoding::encode(service)
    );

    if options.previous {
        // Earlier runs end where the current one started.
        path.push_str("&follow=0");
        if let Some(started) = state.started_at() {
            path.push_str(&format!(
                "&until={}.{:09}",
                started.timestamp(),
                started.timestamp_subsec_nanos()
            ));
        }
    } else if options.follow {
        path.push_str("&follow=1");
    } else {
        path.push_str("&follow=0");
    }

    if let Some(since) = options.since {
        path.push_str(&format!(
            "&since={}.{:09}",
            since.timestamp(),
            since.timestamp_subsec_nanos()
        ));
    }
    path
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
