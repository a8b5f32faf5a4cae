//! Error types for the contentflow engine.
//!
//! Node-level failures are expressed as [`NodeError`], wrapped with the
//! offending node's identity as [`WrappedNodeError`], and surfaced to callers
//! as [`ExecutionError`] together with the terminal execution record.

use crate::executor::ExecutionRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Crate-level error for configuration and I/O surfaces.
#[derive(Debug, Error)]
pub enum ContentflowError {
    /// Invalid engine configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A persistence operation failed.
    #[error("{0}")]
    Storage(#[from] StorageError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raised when a node's type is not present in the dispatch table.
///
/// This is a pre-execution validation failure: it is returned before any
/// handler runs and before any envelope is produced for the node.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown node type '{node_type}' for node '{node_id}'")]
pub struct DispatchError {
    /// The node id.
    pub node_id: String,
    /// The unrecognised type string.
    pub node_type: String,
}

impl DispatchError {
    /// Creates a new dispatch error.
    #[must_use]
    pub fn new(node_id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            node_type: node_type.into(),
        }
    }
}

/// A required input field that was absent at the input node.
///
/// Recorded in envelope metadata; never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("Required field '{field}' is missing: {message}")]
pub struct ValidationError {
    /// The field variable name.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error for a missing required field.
    #[must_use]
    pub fn missing(field: impl Into<String>, label: &str) -> Self {
        Self {
            field: field.into(),
            message: format!("'{label}' is required"),
        }
    }
}

/// Errors raised by the AI invocation adapter and generation providers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// The provider returned no usable content. Never replaced by fallback text.
    #[error("Provider '{provider}' returned empty content for model '{model}'")]
    EmptyContent {
        /// Provider name.
        provider: String,
        /// Model id.
        model: String,
    },

    /// The request could not be completed.
    #[error("Provider '{provider}' request failed: {message}")]
    Request {
        /// Provider name.
        provider: String,
        /// Failure description.
        message: String,
    },

    /// The provider answered with a non-success status.
    #[error("Provider '{provider}' returned status {status}: {message}")]
    Status {
        /// Provider name.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The call exceeded the adapter's timeout.
    #[error("Provider '{provider}' timed out after {seconds}s")]
    Timeout {
        /// Provider name.
        provider: String,
        /// Timeout in seconds.
        seconds: f64,
    },

    /// The response body could not be decoded.
    #[error("Provider '{provider}' returned an invalid response: {message}")]
    InvalidResponse {
        /// Provider name.
        provider: String,
        /// Decode failure.
        message: String,
    },

    /// The call settings are unusable; the provider was not called.
    #[error("Provider '{provider}' is misconfigured: {message}")]
    Config {
        /// Provider name.
        provider: String,
        /// What is wrong.
        message: String,
    },
}

impl ProviderError {
    /// Creates an empty-content error.
    #[must_use]
    pub fn empty_content(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self::EmptyContent {
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Creates a request error.
    #[must_use]
    pub fn request(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by the execution store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// Writing the artifact failed.
    #[error("Failed to persist output for execution '{execution_id}': {message}")]
    Write {
        /// Execution id.
        execution_id: String,
        /// Failure description.
        message: String,
    },

    /// Reading an artifact failed.
    #[error("Failed to load output for execution '{execution_id}': {message}")]
    Read {
        /// Execution id.
        execution_id: String,
        /// Failure description.
        message: String,
    },
}

impl StorageError {
    /// Creates a write error.
    #[must_use]
    pub fn write(execution_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            execution_id: execution_id.into(),
            message: message.into(),
        }
    }
}

/// Errors a node handler can return.
#[derive(Debug, Clone, Error)]
pub enum NodeError {
    /// Unknown node type.
    #[error("{0}")]
    Dispatch(#[from] DispatchError),

    /// The AI provider failed.
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// The node's configuration cannot be interpreted.
    #[error("Invalid node configuration: {0}")]
    InvalidConfig(String),

    /// The node had nothing to work on.
    #[error("Missing input: {0}")]
    MissingInput(String),
}

impl NodeError {
    /// Short machine-readable category for the error.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Dispatch(_) => "DispatchError",
            Self::Provider(_) => "ProviderError",
            Self::InvalidConfig(_) => "InvalidConfig",
            Self::MissingInput(_) => "MissingInput",
        }
    }
}

/// A node error wrapped with the identity of the node that raised it.
#[derive(Debug, Clone, Error)]
#[error("Node '{node_id}' ({node_type}) failed: {error}")]
pub struct WrappedNodeError {
    /// The failing node id.
    pub node_id: String,
    /// The failing node's type string.
    pub node_type: String,
    /// The underlying error.
    #[source]
    pub error: NodeError,
}

impl WrappedNodeError {
    /// Wraps an error for the given node.
    #[must_use]
    pub fn new(node_id: impl Into<String>, node_type: impl Into<String>, error: NodeError) -> Self {
        Self {
            node_id: node_id.into(),
            node_type: node_type.into(),
            error,
        }
    }

    /// Returns true if the underlying error is a dispatch error.
    #[must_use]
    pub fn is_dispatch(&self) -> bool {
        matches!(self.error, NodeError::Dispatch(_))
    }

    /// Returns true if the underlying error is a provider error.
    #[must_use]
    pub fn is_provider(&self) -> bool {
        matches!(self.error, NodeError::Provider(_))
    }

    /// Converts to a dictionary representation for UI/operator layers.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.error.kind()));
        map.insert("node_id".to_string(), serde_json::json!(self.node_id));
        map.insert("node_type".to_string(), serde_json::json!(self.node_type));
        map.insert("message".to_string(), serde_json::json!(self.error.to_string()));
        map
    }
}

/// The terminal error of a run. Carries the final execution record.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A node failed and the run was aborted.
    #[error("{error}")]
    Node {
        /// The record in its terminal `failed` state.
        record: Box<ExecutionRecord>,
        /// The wrapped node error.
        #[source]
        error: WrappedNodeError,
    },

    /// The run was stopped at a node boundary.
    #[error("Execution cancelled: {reason}")]
    Cancelled {
        /// The record in its terminal `cancelled` state.
        record: Box<ExecutionRecord>,
        /// The stop reason.
        reason: String,
    },

    /// Another run with the same execution id is still in flight.
    #[error("Execution '{}' is already running", .record.execution_id)]
    AlreadyRunning {
        /// A `failed` record with no node results.
        record: Box<ExecutionRecord>,
    },
}

impl ExecutionError {
    /// Returns the terminal execution record.
    #[must_use]
    pub fn record(&self) -> &ExecutionRecord {
        match self {
            Self::Node { record, .. }
            | Self::Cancelled { record, .. }
            | Self::AlreadyRunning { record } => record,
        }
    }

    /// Consumes the error and returns the terminal execution record.
    #[must_use]
    pub fn into_record(self) -> ExecutionRecord {
        match self {
            Self::Node { record, .. }
            | Self::Cancelled { record, .. }
            | Self::AlreadyRunning { record } => *record,
        }
    }

    /// Returns the wrapped node error, if a node failed.
    #[must_use]
    pub fn node_error(&self) -> Option<&WrappedNodeError> {
        match self {
            Self::Node { error, .. } => Some(error),
            Self::Cancelled { .. } | Self::AlreadyRunning { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_message() {
        let err = DispatchError::new("n2", "unknownWidget");
        assert!(err.to_string().contains("unknownWidget"));
        assert!(err.to_string().contains("n2"));
    }

    #[test]
    fn test_wrapped_error_to_dict() {
        let err = WrappedNodeError::new(
            "writer",
            "contentWriter",
            ProviderError::empty_content("openai", "gpt-4o").into(),
        );
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "ProviderError");
        assert_eq!(dict.get("node_type").unwrap(), "contentWriter");
        assert!(err.is_provider());
        assert!(!err.is_dispatch());
    }

    #[test]
    fn test_validation_error_missing() {
        let err = ValidationError::missing("topic", "Topic");
        assert_eq!(err.field, "topic");
        assert!(err.to_string().contains("topic"));
    }

    #[test]
    fn test_node_error_kind() {
        assert_eq!(NodeError::InvalidConfig("x".into()).kind(), "InvalidConfig");
        assert_eq!(NodeError::MissingInput("topic".into()).kind(), "MissingInput");
        assert_eq!(
            NodeError::from(ProviderError::request("openai", "reset")).kind(),
            "ProviderError"
        );
    }
}
