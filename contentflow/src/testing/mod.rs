//! Testing utilities for contentflow workflows.
//!
//! This module provides:
//! - A scripted generation provider
//! - A dispatcher spy and a failing store
//! - Workflow fixtures and record assertions

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_completed, assert_failed_at, assert_not_dispatched};
pub use fixtures::{
    input_node, output_node, three_node_workflow, topic_input, writer_node,
};
pub use mocks::{FailingStore, MockGenerationProvider, RecordedDispatch, RecordingDispatcher};
