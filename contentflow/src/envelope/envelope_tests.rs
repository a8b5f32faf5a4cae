//! Tests for envelope construction, extension and finalization.

#[cfg(test)]
mod tests {
    use crate::core::AiUsage;
    use crate::envelope::{
        ContextEnvelope, CustomerContext, CustomerTier, UserInput, SEED_NODE_ID, SEED_NODE_TYPE,
    };
    use crate::nodes::{InputField, Node, NodeConfig, NodeKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn input_config() -> NodeConfig {
        NodeConfig::new()
            .with_input_field(InputField::new("topic", "Topic").required())
            .with_input_field(InputField::new("audience", "Audience").required())
            .with_input_field(InputField::new("tone", "Tone"))
    }

    fn user_input(pairs: &[(&str, serde_json::Value)]) -> UserInput {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn seed() -> ContextEnvelope {
        ContextEnvelope::create_initial(
            &input_config(),
            user_input(&[("topic", json!("X")), ("audience", json!("devs"))]),
            CustomerContext::new(CustomerTier::Starter).with_user_id("u-1"),
            "wf-1",
        )
    }

    fn usage(tokens: u64, cost: f64) -> AiUsage {
        AiUsage {
            tokens,
            cost,
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }

    #[test]
    fn test_create_initial_seed_shape() {
        let env = seed();

        assert_eq!(env.version, 1);
        assert_eq!(env.node_id, SEED_NODE_ID);
        assert_eq!(env.node_type, SEED_NODE_TYPE);
        assert_eq!(env.workflow_id, "wf-1");
        assert!(env.is_seed());
        assert!(env.current_node_output.is_none());
        assert!(env.continuity_data.is_empty());
        assert_eq!(env.metadata.processing_step, 0);
        assert!(env.metadata.validation.is_valid());
        assert_eq!(env.metadata.selected_variables, vec!["topic", "audience"]);
    }

    #[test]
    fn test_create_initial_records_missing_required_fields() {
        let env = ContextEnvelope::create_initial(
            &input_config(),
            user_input(&[("topic", json!("  ")), ("tone", json!("casual"))]),
            CustomerContext::default(),
            "wf-1",
        );

        assert!(!env.metadata.validation.is_valid());
        assert_eq!(
            env.metadata.validation.missing_fields(),
            vec!["topic", "audience"]
        );
        assert_eq!(env.metadata.selected_variables, vec!["tone"]);
        // The input is kept as supplied.
        assert_eq!(env.user_input.get("topic"), Some(&json!("  ")));
    }

    #[test]
    fn test_create_initial_without_declared_fields_selects_all() {
        let env = ContextEnvelope::create_initial(
            &NodeConfig::new(),
            user_input(&[("a", json!(1)), ("b", json!(null))]),
            CustomerContext::default(),
            "wf-1",
        );
        assert_eq!(env.metadata.selected_variables, vec!["a"]);
    }

    #[test]
    fn test_extend_shares_user_input_and_customer_context() {
        let first = seed();
        let node_a = Node::of_kind("a", NodeKind::Input);
        let node_b = Node::of_kind("b", NodeKind::ContentWriter);

        let second = first.extend(&node_a, json!({"topic": "X"}));
        let third = second.extend(&node_b, json!({"content": "Y"}));

        for env in [&second, &third] {
            assert!(Arc::ptr_eq(&first.user_input, &env.user_input));
            assert!(Arc::ptr_eq(&first.customer_context, &env.customer_context));
            assert_eq!(first.user_input, env.user_input);
        }
    }

    #[test]
    fn test_extend_leaves_previous_envelope_untouched() {
        let first = seed();
        let before = first.clone();
        let _ = first.extend(&Node::of_kind("a", NodeKind::Input), json!("out"));
        assert_eq!(first, before);
    }

    #[test]
    fn test_accumulated_context_has_k_entries_after_k_nodes() {
        let mut env = seed();
        let ids = ["in", "writer", "seo", "gate", "out"];

        for (k, id) in ids.iter().enumerate() {
            let before = env.continuity_data.accumulated_context.clone();
            env = env.extend(&Node::new(*id, "aiProcess"), json!({"content": id}));

            let after = &env.continuity_data.accumulated_context;
            assert_eq!(after.len(), k + 1);
            for (key, value) in &before {
                assert_eq!(after.get(key), Some(value));
            }
        }

        let ctx = &env.continuity_data.accumulated_context;
        assert_eq!(ctx.get(SEED_NODE_ID), Some(&serde_json::Value::Null));
        assert_eq!(ctx.get("seo"), Some(&json!({"content": "seo"})));
        assert!(!ctx.contains_key("out"));
        assert_eq!(env.metadata.processing_step, 5);
    }

    #[test]
    fn test_extend_records_previous_node() {
        let env = seed()
            .extend(&Node::of_kind("in", NodeKind::Input), json!({"topic": "X"}))
            .extend(&Node::of_kind("writer", NodeKind::BlogWriter), json!({"content": "Y"}));

        let previous = &env.continuity_data.previous_nodes;
        assert_eq!(previous.len(), 2);
        assert_eq!(previous[1].node_id, "in");
        assert_eq!(previous[1].node_type, "input");
        assert_eq!(previous[1].output, json!({"topic": "X"}));
        assert_eq!(env.continuity_data.workflow_history[1].processing_step, 1);
        assert_eq!(env.latest_content(), Some("Y"));
    }

    #[test]
    fn test_finalize_summary_counts_and_sums() {
        let steps = [(10_u64, 0.001_f64), (32, 0.004), (0, 0.0), (58, 0.005)];
        let mut env = seed();
        for (i, (tokens, cost)) in steps.iter().enumerate() {
            let node = Node::new(format!("n{i}"), "aiProcess");
            env = env
                .extend(&node, json!({"content": "text"}))
                .with_ai_usage(Some(usage(*tokens, *cost)));
        }

        let finalized = env.finalize(json!({"content": "done"}));
        let summary = finalized.metadata.workflow_summary.clone().unwrap();

        assert_eq!(summary.total_nodes, steps.len() + 1);
        assert_eq!(summary.total_tokens, 100);
        assert!((summary.total_cost - 0.01).abs() < 1e-9);
        assert!(summary.completed_at >= summary.started_at);
        assert_eq!(finalized.node_id, "n3");
        assert_eq!(finalized.latest_content(), Some("done"));
    }

    #[test]
    fn test_finalize_on_seed() {
        let summary = seed()
            .finalize(json!(null))
            .metadata
            .workflow_summary
            .unwrap();
        assert_eq!(summary.total_nodes, 1);
        assert_eq!(summary.total_tokens, 0);
    }

    #[test]
    fn test_extract_for_invocation_exposes_latest_output_only() {
        let env = seed()
            .extend(&Node::of_kind("in", NodeKind::Input), json!({"topic": "X"}))
            .extend(&Node::of_kind("w", NodeKind::ContentWriter), json!({"content": "Draft"}));

        let view = env.extract_for_invocation();

        assert_eq!(view.previous_context.node_type, "contentWriter");
        assert_eq!(view.previous_content(), Some("Draft"));
        assert_eq!(view.user_value("topic").as_deref(), Some("X"));
        assert_eq!(view.user_value("missing"), None);
        assert_eq!(view.metadata.processing_step, 2);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("continuityData").is_none());
    }

    #[test]
    fn test_extensions_carry_forward() {
        let env = seed()
            .with_extension("preview.viewports", json!(["desktop"]))
            .extend(&Node::of_kind("p", NodeKind::Preview), json!("x"));
        assert!(env.extensions.contains("preview.viewports"));
    }

    #[test]
    fn test_envelope_serde_roundtrip_keeps_wire_names() {
        let env = seed().extend(&Node::of_kind("in", NodeKind::Input), json!({"topic": "X"}));
        let json = serde_json::to_value(&env).unwrap();

        assert!(json.get("userInput").is_some());
        assert!(json["continuityData"].get("accumulatedContext").is_some());

        let back: ContextEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, env);
    }
}
