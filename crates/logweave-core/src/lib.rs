//! logweave-core: shared types for the logweave pipeline.
//!
//! # Architecture
//!
//! ```text
//! Forwarder(s) ──► shared queue ──► Merge-Printer ──► output
//!      ▲                                  │
//!      └──── Restart Waiter ◄─────────────┘ (per-service retry loop)
//! ```
//!
//! This crate owns the records that cross the queue, the line parser used to
//! recover each line's generation time, the label palette and configuration.
//! The engine itself lives in `logweave-mux`; the collaborators that actually
//! talk to a container runtime live in `logweave-feeds`.

pub mod config;
pub mod palette;
pub mod parser;
pub mod types;

pub use palette::Palette;
pub use parser::{parse_line, ParseError};
pub use types::{ParsedRecord, RawRecord, RunOptions, SharedError, StreamOptions};
