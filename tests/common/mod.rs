//! Shared test utilities for the logweave integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. The scripted fakes sleep on tokio time, so harnesses
//! running with `start_paused = true` stay deterministic.
#![allow(dead_code)]

pub mod capture;
pub mod fake_docker_api;
pub mod fakes;
pub mod fixtures;

pub use capture::*;
pub use fakes::*;
pub use fixtures::*;
