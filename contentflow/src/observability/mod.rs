//! Logging setup and span attributes for pipeline runs.

mod spans;
mod subscriber;

pub use spans::{NodeSpanAttributes, RunSpanAttributes};
pub use subscriber::{init_tracing, LogFormat};
