//! Cooperative stop requests for running pipelines.
//!
//! A stop request only sets a flag. The executor checks it between nodes, so
//! the node in flight always completes before the run halts.

mod token;

pub use token::{CancellationToken, StopCallback, StopRequest};
