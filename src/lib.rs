//! logweave: follow the logs of several containers as one time-ordered
//! stream.
//!
//! The binary is a thin shell around [`app::run`]: it parses the [`cli::Cli`],
//! installs logging and hands control to the engine in `logweave-mux`. Both
//! modules are public so the integration harnesses can drive them directly.

pub mod app;
pub mod cli;
