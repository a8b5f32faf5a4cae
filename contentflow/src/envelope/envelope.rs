//! The context envelope threaded through a pipeline run.

use super::continuity::{ContinuityData, EnvelopeSnapshot, PreviousNode};
use super::customer::{CustomerContext, UserInput};
use super::summary::WorkflowSummary;
use crate::core::AiUsage;
use crate::errors::ValidationError;
use crate::nodes::{Node, NodeConfig};
use crate::utils::{now_utc, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Current envelope schema version.
pub const ENVELOPE_VERSION: u32 = 1;

/// Node id of the seed envelope produced by [`ContextEnvelope::create_initial`].
pub const SEED_NODE_ID: &str = "__workflow_start__";

/// Node type of the seed envelope.
pub const SEED_NODE_TYPE: &str = "workflowStart";

/// Outcome of checking the user input against the input node's declared fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Required fields that were absent or empty.
    #[serde(default)]
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// Returns true if no required field was missing.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Names of the missing fields.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }
}

/// Envelope bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeMetadata {
    /// Declared input variables that were supplied.
    #[serde(default)]
    pub selected_variables: Vec<String>,
    /// Number of nodes folded into this envelope.
    pub processing_step: u32,
    /// AI usage of the node that produced this envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_usage: Option<AiUsage>,
    /// Input validation notes from the seed envelope.
    #[serde(default)]
    pub validation: ValidationReport,
    /// Set by [`ContextEnvelope::finalize`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_summary: Option<WorkflowSummary>,
}

/// A bounded bag of node-specific payloads.
///
/// Keys are namespaced by the producing node kind; the engine never reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionBundle {
    /// Extension data keyed by name.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl ExtensionBundle {
    /// Creates a new empty extension bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an extension.
    pub fn register(&mut self, name: impl Into<String>, data: serde_json::Value) {
        self.extensions.insert(name.into(), data);
    }

    /// Gets an extension by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.extensions.get(name)
    }

    /// Checks if an extension is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.extensions.contains_key(name)
    }
}

/// The latest output as exposed to the AI adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousContext {
    /// Id of the node that produced the output.
    pub node_id: String,
    /// Type of the node that produced the output.
    pub node_type: String,
    /// The output itself.
    pub output: Option<serde_json::Value>,
}

/// Non-bookkeeping metadata exposed to the AI adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationMetadata {
    /// Workflow id.
    pub workflow_id: String,
    /// Step counter.
    pub processing_step: u32,
    /// Supplied input variables.
    pub selected_variables: Vec<String>,
}

/// Projection of an envelope handed to the AI invocation adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationView {
    /// Original user input.
    pub user_input: Arc<UserInput>,
    /// Customer context.
    pub customer_context: Arc<CustomerContext>,
    /// The most recent output.
    pub previous_context: PreviousContext,
    /// Invocation metadata.
    pub metadata: InvocationMetadata,
}

impl InvocationView {
    /// A user input value rendered as text. Strings are returned verbatim,
    /// other scalars through their JSON form.
    #[must_use]
    pub fn user_value(&self, key: &str) -> Option<String> {
        match self.user_input.get(key)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// The text content of the previous output, if it has any.
    #[must_use]
    pub fn previous_content(&self) -> Option<&str> {
        self.previous_context.output.as_ref().and_then(content_of)
    }
}

/// Extracts the text content of a node output: the output itself when it is a
/// string, otherwise its `content` field.
#[must_use]
pub fn content_of(output: &serde_json::Value) -> Option<&str> {
    match output {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Object(map) => map.get("content").and_then(serde_json::Value::as_str),
        _ => None,
    }
}

/// The accumulating record threaded from node to node.
///
/// Envelopes are never mutated once produced: [`extend`](Self::extend) and
/// [`finalize`](Self::finalize) return new values. `user_input` and
/// `customer_context` are shared by reference across the whole chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextEnvelope {
    /// Schema version.
    pub version: u32,
    /// Type of the node that produced this envelope.
    pub node_type: String,
    /// Id of the node that produced this envelope.
    pub node_id: String,
    /// When this envelope was produced.
    pub timestamp: Timestamp,
    /// Workflow id.
    pub workflow_id: String,
    /// Customer context.
    pub customer_context: Arc<CustomerContext>,
    /// Original user input. Never overwritten.
    pub user_input: Arc<UserInput>,
    /// Output of the node that produced this envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_node_output: Option<serde_json::Value>,
    /// Prior node history.
    #[serde(default)]
    pub continuity_data: ContinuityData,
    /// Bookkeeping.
    #[serde(default)]
    pub metadata: EnvelopeMetadata,
    /// Node-specific payloads.
    #[serde(default)]
    pub extensions: ExtensionBundle,
}

impl ContextEnvelope {
    /// Creates the seed envelope of a run.
    ///
    /// Required fields declared in `node_config` that are absent from
    /// `raw_user_input` are recorded in `metadata.validation`; the input is
    /// never rejected.
    #[must_use]
    pub fn create_initial(
        node_config: &NodeConfig,
        raw_user_input: UserInput,
        customer_context: CustomerContext,
        workflow_id: impl Into<String>,
    ) -> Self {
        let mut errors = Vec::new();
        let mut selected_variables = Vec::new();

        for field in &node_config.input_fields {
            if is_present(raw_user_input.get(&field.variable)) {
                selected_variables.push(field.variable.clone());
            } else if field.required {
                errors.push(ValidationError::missing(&field.variable, field.label()));
            }
        }
        if node_config.input_fields.is_empty() {
            selected_variables = raw_user_input
                .iter()
                .filter(|(_, v)| is_present(Some(v)))
                .map(|(k, _)| k.clone())
                .collect();
        }

        Self {
            version: ENVELOPE_VERSION,
            node_type: SEED_NODE_TYPE.to_string(),
            node_id: SEED_NODE_ID.to_string(),
            timestamp: now_utc(),
            workflow_id: workflow_id.into(),
            customer_context: Arc::new(customer_context),
            user_input: Arc::new(raw_user_input),
            current_node_output: None,
            continuity_data: ContinuityData::default(),
            metadata: EnvelopeMetadata {
                selected_variables,
                processing_step: 0,
                ai_usage: None,
                validation: ValidationReport { errors },
                workflow_summary: None,
            },
            extensions: ExtensionBundle::new(),
        }
    }

    /// Returns the envelope produced by `current_node` with `produced_output`.
    ///
    /// This envelope is appended to the continuity data and its output is
    /// inserted into `accumulated_context` under its node id.
    #[must_use]
    pub fn extend(&self, current_node: &Node, produced_output: serde_json::Value) -> Self {
        self.successor(&current_node.id, &current_node.node_type, produced_output)
    }

    /// Like [`extend`](Self::extend) for the terminal output, additionally
    /// computing the workflow summary from the history.
    #[must_use]
    pub fn finalize(&self, final_output: serde_json::Value) -> Self {
        let mut finalized = self.successor(&self.node_id, &self.node_type, final_output);
        finalized.metadata.ai_usage = None;
        let summary = WorkflowSummary::from_history(
            &finalized.continuity_data.workflow_history,
            finalized.timestamp,
        );
        finalized.metadata.workflow_summary = Some(summary);
        finalized
    }

    /// Sets the AI usage of the node that produced this envelope.
    #[must_use]
    pub fn with_ai_usage(mut self, usage: Option<AiUsage>) -> Self {
        self.metadata.ai_usage = usage;
        self
    }

    /// Registers a node-specific payload.
    #[must_use]
    pub fn with_extension(mut self, name: impl Into<String>, data: serde_json::Value) -> Self {
        self.extensions.register(name, data);
        self
    }

    /// Projection used by the AI invocation adapter.
    #[must_use]
    pub fn extract_for_invocation(&self) -> InvocationView {
        InvocationView {
            user_input: Arc::clone(&self.user_input),
            customer_context: Arc::clone(&self.customer_context),
            previous_context: PreviousContext {
                node_id: self.node_id.clone(),
                node_type: self.node_type.clone(),
                output: self.current_node_output.clone(),
            },
            metadata: InvocationMetadata {
                workflow_id: self.workflow_id.clone(),
                processing_step: self.metadata.processing_step,
                selected_variables: self.metadata.selected_variables.clone(),
            },
        }
    }

    /// The text content of this envelope's output.
    #[must_use]
    pub fn latest_content(&self) -> Option<&str> {
        self.current_node_output.as_ref().and_then(content_of)
    }

    /// Returns true if this is the seed envelope.
    #[must_use]
    pub fn is_seed(&self) -> bool {
        self.node_id == SEED_NODE_ID && self.continuity_data.is_empty()
    }

    fn successor(&self, node_id: &str, node_type: &str, output: serde_json::Value) -> Self {
        let mut continuity_data = self.continuity_data.clone();
        continuity_data.record(
            PreviousNode {
                node_id: self.node_id.clone(),
                node_type: self.node_type.clone(),
                output: self.current_node_output.clone().unwrap_or(serde_json::Value::Null),
                timestamp: self.timestamp,
            },
            self.snapshot(),
        );

        Self {
            version: ENVELOPE_VERSION,
            node_type: node_type.to_string(),
            node_id: node_id.to_string(),
            timestamp: now_utc(),
            workflow_id: self.workflow_id.clone(),
            customer_context: Arc::clone(&self.customer_context),
            user_input: Arc::clone(&self.user_input),
            current_node_output: Some(output),
            continuity_data,
            metadata: EnvelopeMetadata {
                selected_variables: self.metadata.selected_variables.clone(),
                processing_step: self.metadata.processing_step + 1,
                ai_usage: None,
                validation: self.metadata.validation.clone(),
                workflow_summary: None,
            },
            extensions: self.extensions.clone(),
        }
    }

    fn snapshot(&self) -> EnvelopeSnapshot {
        EnvelopeSnapshot {
            node_id: self.node_id.clone(),
            node_type: self.node_type.clone(),
            timestamp: self.timestamp,
            processing_step: self.metadata.processing_step,
            ai_usage: self.metadata.ai_usage.clone(),
        }
    }
}

fn is_present(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
        Some(serde_json::Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}
