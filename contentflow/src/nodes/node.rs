//! Node, edge and workflow definitions as authored in the graph editor.

use super::NodeKind;
use crate::core::NodeRole;
use serde::{Deserialize, Serialize};

/// One field collected by an input node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputField {
    /// The key the value is stored under in the user input.
    pub variable: String,
    /// Display label.
    #[serde(default)]
    pub name: String,
    /// Field type (`text`, `textarea`, `select`, `number`, ...).
    #[serde(default = "default_field_type", rename = "type")]
    pub field_type: String,
    /// Whether the field must be present.
    #[serde(default)]
    pub required: bool,
    /// Allowed values for select-style fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

fn default_field_type() -> String {
    "text".to_string()
}

impl InputField {
    /// Creates a text field.
    #[must_use]
    pub fn new(variable: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            name: name.into(),
            field_type: default_field_type(),
            required: false,
            options: None,
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Display label, falling back to the variable name.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.variable
        } else {
            &self.name
        }
    }
}

/// Typed view of a node's `data` map.
///
/// Well-known settings are typed; everything else is kept in `extra` so that
/// handler-specific settings survive round trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Candidate models in `provider:modelId` form; the first one is used.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_models: Vec<String>,
    /// Explicit provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_provider: Option<String>,
    /// Explicit model id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<String>,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Completion token limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Prepended to the generated prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Overrides the built-in template for the node kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
    /// Fields collected by input nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_fields: Vec<InputField>,
    /// Any other handler-specific setting.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NodeConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds a `provider:modelId` entry.
    #[must_use]
    pub fn with_selected_model(mut self, model: impl Into<String>) -> Self {
        self.selected_models.push(model.into());
        self
    }

    /// Adds an input field.
    #[must_use]
    pub fn with_input_field(mut self, field: InputField) -> Self {
        self.input_fields.push(field);
        self
    }

    /// Sets an extra setting.
    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Reads an extra string setting.
    #[must_use]
    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(serde_json::Value::as_str)
    }

    /// Reads an extra numeric setting. Numeric strings are accepted.
    #[must_use]
    pub fn setting_f64(&self, key: &str) -> Option<f64> {
        match self.extra.get(key)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Reads an extra boolean setting.
    #[must_use]
    pub fn setting_bool(&self, key: &str) -> Option<bool> {
        self.extra.get(key).and_then(serde_json::Value::as_bool)
    }
}

/// A node in a workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// The node id, unique within its workflow.
    pub id: String,
    /// The raw type string from the graph.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Handler settings.
    #[serde(default)]
    pub data: NodeConfig,
    /// Canvas position; irrelevant to execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<serde_json::Value>,
}

impl Node {
    /// Creates a node with an empty configuration.
    #[must_use]
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            data: NodeConfig::default(),
            position: None,
        }
    }

    /// Creates a node of a known kind.
    #[must_use]
    pub fn of_kind(id: impl Into<String>, kind: NodeKind) -> Self {
        Self::new(id, kind.as_str())
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, data: NodeConfig) -> Self {
        self.data = data;
        self
    }

    /// The parsed kind, if the type is known.
    #[must_use]
    pub fn kind(&self) -> Option<NodeKind> {
        NodeKind::parse(&self.node_type)
    }

    /// The role of the node, if the type is known.
    #[must_use]
    pub fn role(&self) -> Option<NodeRole> {
        self.kind().map(|k| k.role())
    }

    /// Display name: the label when set, otherwise the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.data.label.as_deref().unwrap_or(&self.id)
    }
}

/// A connection between two nodes. Rendered by the editor, ignored by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
}

/// A user-authored workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Nodes in execution order.
    pub nodes: Vec<Node>,
    /// Editor connections.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Workflow {
    /// Parses a workflow from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Ids of nodes whose type is not in the catalog.
    #[must_use]
    pub fn unknown_nodes(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.kind().is_none())
            .map(|n| n.id.as_str())
            .collect()
    }
}
