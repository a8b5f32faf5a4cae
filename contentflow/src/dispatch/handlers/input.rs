use crate::core::NodeRole;
use crate::dispatch::{DispatchContext, HandlerOutput, RoleHandler};
use crate::envelope::ContextEnvelope;
use crate::errors::NodeError;
use crate::nodes::{Node, NodeKind};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Echoes the collected user input. Never calls a provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputHandler;

#[async_trait]
impl RoleHandler for InputHandler {
    fn role(&self) -> NodeRole {
        NodeRole::Input
    }

    async fn handle(
        &self,
        kind: NodeKind,
        node: &Node,
        envelope: &ContextEnvelope,
        _ctx: &DispatchContext<'_>,
    ) -> Result<HandlerOutput, NodeError> {
        let user_input = &envelope.user_input;
        let fields = &node.data.input_fields;

        let output = if fields.is_empty() {
            Value::Object((**user_input).clone())
        } else {
            fields
                .iter()
                .map(|f| {
                    let value = user_input.get(&f.variable).cloned().unwrap_or(Value::Null);
                    (f.variable.clone(), value)
                })
                .collect::<serde_json::Map<_, _>>()
                .into()
        };

        let validation = &envelope.metadata.validation;
        let mut result = HandlerOutput::new(output)
            .with_metadata("inputKind", json!(kind.as_str()))
            .with_metadata(
                "selectedVariables",
                json!(envelope.metadata.selected_variables),
            );
        if !validation.is_valid() {
            result = result.with_metadata("validationErrors", json!(validation.errors));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::CustomerContext;
    use crate::nodes::{InputField, NodeConfig};
    use crate::progress::NoOpProgressSink;
    use pretty_assertions::assert_eq;

    fn envelope(config: &NodeConfig, input: Value) -> ContextEnvelope {
        ContextEnvelope::create_initial(
            config,
            input.as_object().cloned().unwrap_or_default(),
            CustomerContext::default(),
            "wf",
        )
    }

    #[tokio::test]
    async fn test_echoes_declared_fields() {
        let config = NodeConfig::new()
            .with_input_field(InputField::new("topic", "Topic").required())
            .with_input_field(InputField::new("tone", "Tone").required());
        let node = Node::of_kind("in", NodeKind::FormInput).with_config(config.clone());
        let env = envelope(&config, json!({"topic": "X", "extra": 1}));
        let sink = NoOpProgressSink;
        let ctx = DispatchContext::new("e1", &sink, 0, 1);

        let out = InputHandler
            .handle(NodeKind::FormInput, &node, &env, &ctx)
            .await
            .unwrap();

        assert_eq!(out.output, json!({"topic": "X", "tone": null}));
        assert_eq!(out.metadata["validationErrors"][0]["field"], "tone");
        assert!(out.ai_usage.is_none());
    }

    #[tokio::test]
    async fn test_echoes_everything_without_declared_fields() {
        let node = Node::of_kind("in", NodeKind::Input);
        let env = envelope(&NodeConfig::new(), json!({"topic": "X", "n": 2}));
        let sink = NoOpProgressSink;
        let ctx = DispatchContext::new("e1", &sink, 0, 1);

        let out = InputHandler
            .handle(NodeKind::Input, &node, &env, &ctx)
            .await
            .unwrap();

        assert_eq!(out.output, json!({"topic": "X", "n": 2}));
        assert!(!out.metadata.contains_key("validationErrors"));
    }
}
