//! Pipeline execution.
//!
//! [`PipelineExecutor`] runs one ordered node list to completion, failure or
//! cancellation. [`WorkflowEngine`] owns an executor and tracks the stop
//! tokens of runs in flight.

mod engine;
mod pipeline;
mod record;
mod request;

pub use engine::{StopListener, WorkflowEngine};
pub use pipeline::PipelineExecutor;
pub use record::{ExecutionRecord, NodeErrorRecord};
pub use request::ExecutionRequest;
