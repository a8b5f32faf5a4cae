//! Workflow fixtures.

use crate::envelope::UserInput;
use crate::nodes::{InputField, Node, NodeConfig, NodeKind};

/// An input node collecting a required `topic`.
#[must_use]
pub fn input_node(id: &str) -> Node {
    Node::of_kind(id, NodeKind::Input).with_config(
        NodeConfig::new()
            .with_label("Brief")
            .with_input_field(InputField::new("topic", "Topic").required()),
    )
}

/// A content writer node.
#[must_use]
pub fn writer_node(id: &str) -> Node {
    Node::of_kind(id, NodeKind::ContentWriter)
        .with_config(NodeConfig::new().with_label("Writer"))
}

/// A markdown output node.
#[must_use]
pub fn output_node(id: &str) -> Node {
    Node::of_kind(id, NodeKind::Output).with_config(
        NodeConfig::new()
            .with_label("Output")
            .with_setting("format", serde_json::json!("markdown")),
    )
}

/// `[input, contentWriter, output]`.
#[must_use]
pub fn three_node_workflow() -> Vec<Node> {
    vec![input_node("in"), writer_node("writer"), output_node("out")]
}

/// User input with only a topic.
#[must_use]
pub fn topic_input(topic: &str) -> UserInput {
    let mut input = UserInput::new();
    input.insert("topic".to_string(), serde_json::json!(topic));
    input
}
