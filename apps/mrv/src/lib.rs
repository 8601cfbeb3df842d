//! # mrv
//!
//! The MRV readiness application: CLI, HTTP API and configuration around
//! the `mrv-core` engine.

pub mod api;
pub mod cli;
pub mod config;
