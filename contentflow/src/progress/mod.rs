//! Progress reporting.
//!
//! The executor reports every node transition to a [`ProgressSink`]. Sinks are
//! invoked synchronously from the run's control flow and must not block.

mod sink;

pub use sink::{
    CollectingProgressSink, FnProgressSink, LoggingProgressSink, NoOpProgressSink, ProgressSink,
};
