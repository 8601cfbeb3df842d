//! # System Module
//!
//! Maturity stage assessment.
//!
//! Stages are informational: they label a readiness percentage and attach
//! advice, but never gate saving or reporting.

mod stage;

pub use stage::*;
