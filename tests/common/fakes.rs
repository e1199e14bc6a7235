//! Scripted collaborators for driving the engine without a container runtime.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use logweave_core::StreamOptions;
use logweave_feeds::{
    LifecycleWatch, LogSource, LogStream, PhasePredicate, Phase, ReadOutcome, SourceError,
    StartCheck, WatchError,
};
use tokio_util::sync::CancellationToken;

use super::fixtures::stamped;

/// One step of a scripted log stream.
#[derive(Debug, Clone)]
pub enum Step {
    Line(String),
    Pause(Duration),
    End(Option<String>),
    Fail(String),
}

impl Step {
    pub fn line(secs: i64, message: &str) -> Self {
        Step::Line(stamped(secs, message))
    }

    pub fn end() -> Self {
        Step::End(None)
    }

    pub fn pause_ms(ms: u64) -> Self {
        Step::Pause(Duration::from_millis(ms))
    }
}

/// Serves one script per `open` call, per service.
///
/// A script that runs out of steps without `End` keeps the stream open until
/// it is dropped. Opening a service with no scripts left fails with
/// [`SourceError::NotFound`].
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Vec<Step>>>>,
    opened: Mutex<Vec<(String, StreamOptions)>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, service: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(service.to_string())
            .or_default()
            .push_back(steps);
        self
    }

    /// Every `open` call so far, in order.
    pub fn opened(&self) -> Vec<(String, StreamOptions)> {
        self.opened.lock().unwrap().clone()
    }

    pub fn open_count(&self, service: &str) -> usize {
        self.opened().iter().filter(|(s, _)| s == service).count()
    }
}

#[async_trait]
impl LogSource for ScriptedSource {
    async fn open(
        &self,
        service: &str,
        options: &StreamOptions,
    ) -> Result<Box<dyn LogStream>, SourceError> {
        self.opened
            .lock()
            .unwrap()
            .push((service.to_string(), options.clone()));
        let steps = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(service)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| SourceError::NotFound(service.to_string()))?;
        Ok(Box::new(ScriptedStream {
            steps: steps.into(),
        }))
    }
}

struct ScriptedStream {
    steps: VecDeque<Step>,
}

#[async_trait]
impl LogStream for ScriptedStream {
    async fn read_line(&mut self) -> ReadOutcome {
        loop {
            match self.steps.pop_front() {
                Some(Step::Pause(duration)) => tokio::time::sleep(duration).await,
                Some(Step::Line(text)) => return ReadOutcome::Line(text),
                Some(Step::End(trailing)) => {
                    self.steps.push_front(Step::End(None));
                    return ReadOutcome::Ended(trailing);
                }
                Some(Step::Fail(message)) => return ReadOutcome::Failed(SourceError::Frame(message)),
                None => std::future::pending::<()>().await,
            }
        }
    }
}

/// What a [`ScriptedWatch`] does on one `wait_until` call.
#[derive(Debug, Clone)]
pub enum Restart {
    /// Report `Running` after the delay.
    After(Duration),
    Fail(String),
}

/// Replays restart outcomes per service. With nothing scripted, waits until
/// cancelled.
#[derive(Default)]
pub struct ScriptedWatch {
    restarts: Mutex<HashMap<String, VecDeque<Restart>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restart(self, service: &str, restart: Restart) -> Self {
        self.restarts
            .lock()
            .unwrap()
            .entry(service.to_string())
            .or_default()
            .push_back(restart);
        self
    }

    pub fn call_count(&self, service: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|s| *s == service)
            .count()
    }
}

#[async_trait]
impl LifecycleWatch for ScriptedWatch {
    async fn wait_until(
        &self,
        service: &str,
        predicate: &PhasePredicate,
        cancel: &CancellationToken,
    ) -> Result<(), WatchError> {
        self.calls.lock().unwrap().push(service.to_string());
        let next = self
            .restarts
            .lock()
            .unwrap()
            .get_mut(service)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Restart::After(delay)) => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(WatchError::Cancelled),
                    _ = tokio::time::sleep(delay) => {
                        assert!(predicate(Phase::Running));
                        Ok(())
                    }
                }
            }
            Some(Restart::Fail(message)) => Err(WatchError::Failed(SourceError::Frame(message))),
            None => {
                cancel.cancelled().await;
                Err(WatchError::Cancelled)
            }
        }
    }
}

/// Answers `has_ever_started` from a fixed list.
pub struct StartedServices(pub Vec<&'static str>);

#[async_trait]
impl StartCheck for StartedServices {
    async fn has_ever_started(&self, service: &str) -> Result<bool, SourceError> {
        Ok(self.0.iter().any(|started| *started == service))
    }
}
