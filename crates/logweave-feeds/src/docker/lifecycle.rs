//! Lifecycle watch backed by `GET /events`.

use async_trait::async_trait;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::DockerClient;
use crate::{LifecycleWatch, LineSplitter, PhasePredicate, SourceError, WatchError};

#[async_trait]
impl LifecycleWatch for DockerClient {
    async fn wait_until(
        &self,
        service: &str,
        predicate: &PhasePredicate,
        cancel: &CancellationToken,
    ) -> Result<(), WatchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(WatchError::Cancelled),
            result = self.watch(service, predicate) => result,
        }
    }
}

impl DockerClient {
    async fn watch(&self, service: &str, predicate: &PhasePredicate) -> Result<(), WatchError> {
        // Subscribe before the first inspect so a transition in between is
        // still seen as an event.
        let mut events = self.get(&events_path(service), service).await?;
        if predicate(self.phase(service).await?) {
            return Ok(());
        }

        let mut lines = LineSplitter::default();
        loop {
            match events.body.frame().await {
                Some(Ok(frame)) => {
                    let Ok(data) = frame.into_data() else {
                        continue;
                    };
                    lines.push(&data);
                    while let Some(event) = lines.next_line() {
                        trace!(service, %event, "container event");
                        if predicate(self.phase(service).await?) {
                            return Ok(());
                        }
                    }
                }
                Some(Err(err)) => return Err(SourceError::from(err).into()),
                None => return Err(WatchError::Closed),
            }
        }
    }
}

fn events_path(service: &str) -> String {
    let filters = serde_json::json!({
        "container": [service],
        "type": ["container"],
    });
    format!("/events?filters={}", urlencoding::encode(&filters.to_string()))
}
