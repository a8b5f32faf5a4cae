//! Node role and execution status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The canonical role every node kind maps to for dispatch purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Collects the raw user input.
    Input,
    /// Generates or transforms content through an AI provider.
    Process,
    /// Evaluates a rule against the previous output and records a routing decision.
    Condition,
    /// Renders previews of the accumulated content.
    Preview,
    /// Formats and persists the final content.
    Output,
}

impl NodeRole {
    /// All roles, in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::Input,
        Self::Process,
        Self::Condition,
        Self::Preview,
        Self::Output,
    ];

    /// Returns true if nodes of this role call the AI adapter.
    #[must_use]
    pub fn invokes_ai(&self) -> bool {
        matches!(self, Self::Process)
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Process => write!(f, "process"),
            Self::Condition => write!(f, "condition"),
            Self::Preview => write!(f, "preview"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// The status of a whole execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Nodes are being executed.
    Running,
    /// Every node completed.
    Completed,
    /// A node failed and the run was aborted.
    Failed,
    /// A stop request halted the run at a node boundary.
    Cancelled,
}

impl Default for ExecutionStatus {
    fn default() -> Self {
        Self::Running
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl ExecutionStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_role_display() {
        assert_eq!(NodeRole::Input.to_string(), "input");
        assert_eq!(NodeRole::Process.to_string(), "process");
        assert_eq!(NodeRole::Condition.to_string(), "condition");
        assert_eq!(NodeRole::Preview.to_string(), "preview");
        assert_eq!(NodeRole::Output.to_string(), "output");
    }

    #[test]
    fn test_only_process_invokes_ai() {
        let ai_roles: Vec<_> = NodeRole::ALL.iter().filter(|r| r.invokes_ai()).collect();
        assert_eq!(ai_roles, vec![&NodeRole::Process]);
    }

    #[test]
    fn test_execution_status_is_terminal() {
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(ExecutionStatus::Completed.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(ExecutionStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_execution_status_serialize() {
        let json = serde_json::to_string(&ExecutionStatus::Completed).unwrap();
        assert_eq!(json, r#""completed""#);

        let deserialized: ExecutionStatus = serde_json::from_str(r#""failed""#).unwrap();
        assert_eq!(deserialized, ExecutionStatus::Failed);
    }
}
