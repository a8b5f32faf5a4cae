//! Assertions over execution records.

use crate::core::ExecutionStatus;
use crate::errors::ExecutionError;
use crate::executor::ExecutionRecord;

use super::RecordingDispatcher;

/// Asserts that the run completed with one result per node.
pub fn assert_completed(record: &ExecutionRecord, expected_nodes: usize) {
    assert_eq!(
        record.status,
        ExecutionStatus::Completed,
        "Expected completed, got {:?} with errors {:?}",
        record.status,
        record.errors
    );
    assert_eq!(
        record.results.len(),
        expected_nodes,
        "Expected {} results, got {}",
        expected_nodes,
        record.results.len()
    );
}

/// Asserts that the run failed at a node of the given type.
pub fn assert_failed_at(err: &ExecutionError, node_type: &str) {
    let record = err.record();
    assert_eq!(record.status, ExecutionStatus::Failed, "Expected failed, got {:?}", record.status);
    assert_eq!(
        record.errors.first().map(|e| e.node_type.as_str()),
        Some(node_type),
        "Expected failure at '{}', got {:?}",
        node_type,
        record.errors
    );
}

/// Asserts that the spy never saw the node.
pub fn assert_not_dispatched(spy: &RecordingDispatcher, node_id: &str) {
    assert_eq!(
        spy.calls_for(node_id),
        0,
        "Expected '{}' never to be dispatched, dispatched ids: {:?}",
        node_id,
        spy.dispatched_ids()
    );
}
