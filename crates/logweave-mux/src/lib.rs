//! logweave-mux: merges the logs of several services into one stream.
//!
//! One forwarder task per service pushes [`RawRecord`](logweave_core::RawRecord)s
//! onto a bounded queue. The [`MergePrinter`] collects them into short
//! windows, sorts each window by the time the lines were generated and writes
//! them out. [`Engine::run`] supervises the forwarders, re-attaches to
//! services that restart while following, and stops once every service is
//! done or the cancellation token fires.

mod engine;
mod error;
mod forwarder;
mod printer;
mod render;
mod restart;
mod window;

pub use engine::{Engine, EngineSettings};
pub use error::MuxError;
pub use forwarder::{forward_logs, ForwardError};
pub use printer::MergePrinter;
pub use render::Renderer;
pub use restart::wait_for_restart;
pub use window::{flush_window, resolve_window};
