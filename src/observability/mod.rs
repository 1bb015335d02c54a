//! Observability subsystem.
//!
//! Logging only: `tracing` events with structured fields, one span per
//! request from tower-http, and the request ID on every relay log line.

pub mod logging;

pub use logging::init_tracing;
