use crate::envelope::{CustomerContext, UserInput};
use crate::nodes::{Node, Workflow};

/// Everything needed to start a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionRequest {
    /// Execution id; generated when absent.
    pub execution_id: Option<String>,
    /// Workflow id.
    pub workflow_id: String,
    /// Nodes in execution order.
    pub nodes: Vec<Node>,
    /// Initial user input.
    pub user_input: UserInput,
    /// Customer the run executes for.
    pub customer_context: CustomerContext,
}

impl ExecutionRequest {
    /// Creates a request for an ordered node list.
    #[must_use]
    pub fn new(workflow_id: impl Into<String>, nodes: Vec<Node>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            nodes,
            ..Default::default()
        }
    }

    /// Creates a request running a workflow's nodes in their listed order.
    #[must_use]
    pub fn from_workflow(workflow: &Workflow) -> Self {
        Self::new(workflow.id.clone(), workflow.nodes.clone())
    }

    /// Sets the execution id.
    #[must_use]
    pub fn with_execution_id(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = Some(execution_id.into());
        self
    }

    /// Sets the user input.
    #[must_use]
    pub fn with_user_input(mut self, user_input: UserInput) -> Self {
        self.user_input = user_input;
        self
    }

    /// Sets one user input value.
    #[must_use]
    pub fn with_input(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.user_input.insert(key.into(), value);
        self
    }

    /// Sets the customer context.
    #[must_use]
    pub fn with_customer_context(mut self, customer_context: CustomerContext) -> Self {
        self.customer_context = customer_context;
        self
    }
}
