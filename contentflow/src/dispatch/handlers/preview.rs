use super::previous_text;
use crate::core::NodeRole;
use crate::dispatch::text_stats::{reading_time_minutes, word_count};
use crate::dispatch::{DispatchContext, HandlerOutput, RoleHandler};
use crate::envelope::ContextEnvelope;
use crate::errors::NodeError;
use crate::nodes::{Node, NodeKind};
use crate::output::{OutputFormat, OutputFormatter, RenderOptions};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Renders previews of the latest content. Never calls a provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewHandler {
    formatter: OutputFormatter,
}

impl PreviewHandler {
    /// Creates a handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn viewports(kind: NodeKind, node: &Node) -> Vec<String> {
        let configured: Vec<String> = node
            .data
            .extra
            .get("viewports")
            .and_then(Value::as_array)
            .map(|v| v.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        if !configured.is_empty() {
            return configured;
        }
        let defaults: &[&str] = match kind {
            NodeKind::MobilePreview => &["mobile"],
            NodeKind::EmailPreview => &["email"],
            _ => &["desktop", "mobile"],
        };
        defaults.iter().map(|v| (*v).to_string()).collect()
    }

    fn viewport_width(viewport: &str) -> u32 {
        match viewport {
            "mobile" => 375,
            "tablet" => 768,
            "email" => 600,
            _ => 1200,
        }
    }

    fn suggestions(content: &str) -> Vec<&'static str> {
        let mut out = Vec::new();
        let words = word_count(content);
        if words < 150 {
            out.push("Expand the content; short pieces rarely rank or convert well.");
        }
        if !content.lines().any(|l| l.trim_start().starts_with('#')) {
            out.push("Add headings to make the structure scannable.");
        }
        if content
            .split("\n\n")
            .any(|p| word_count(p) > 120)
        {
            out.push("Break up paragraphs longer than 120 words.");
        }
        if !content.contains('?') && !content.to_lowercase().contains("contact") {
            out.push("Close with a clear call to action.");
        }
        out
    }
}

#[async_trait]
impl RoleHandler for PreviewHandler {
    fn role(&self) -> NodeRole {
        NodeRole::Preview
    }

    async fn handle(
        &self,
        kind: NodeKind,
        node: &Node,
        envelope: &ContextEnvelope,
        _ctx: &DispatchContext<'_>,
    ) -> Result<HandlerOutput, NodeError> {
        let content = previous_text(envelope).ok_or_else(|| {
            NodeError::MissingInput(format!("preview node '{}' has no content to show", node.id))
        })?;

        let options = RenderOptions::new(OutputFormat::Html, &node.id);
        let html = self.formatter.render(&content, &options, OutputFormat::Html).content;
        let previews: Vec<Value> = Self::viewports(kind, node)
            .into_iter()
            .map(|viewport| {
                let width = Self::viewport_width(&viewport);
                json!({
                    "viewport": viewport,
                    "width": width,
                    "html": format!("<div style=\"max-width:{width}px;margin:0 auto\">\n{html}</div>"),
                })
            })
            .collect();
        let suggestions = Self::suggestions(&content);
        let preview_count = previews.len();

        Ok(HandlerOutput::new(json!({
            "content": content,
            "previews": previews,
            "suggestions": suggestions,
            "wordCount": word_count(&content),
            "readingTimeMinutes": reading_time_minutes(&content),
        }))
        .with_metadata("previewCount", json!(preview_count)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::CustomerContext;
    use crate::nodes::NodeConfig;
    use crate::progress::NoOpProgressSink;
    use pretty_assertions::assert_eq;

    fn after(previous: Value) -> ContextEnvelope {
        ContextEnvelope::create_initial(&NodeConfig::new(), Default::default(), CustomerContext::default(), "wf")
            .extend(&Node::of_kind("w", NodeKind::ContentWriter), previous)
    }

    #[tokio::test]
    async fn test_default_viewports_per_kind() {
        let sink = NoOpProgressSink;
        let ctx = DispatchContext::new("e", &sink, 0, 1);
        let env = after(json!({"content": "# Title\n\nBody text"}));

        for (kind, expected) in [
            (NodeKind::Preview, vec!["desktop", "mobile"]),
            (NodeKind::MobilePreview, vec!["mobile"]),
            (NodeKind::EmailPreview, vec!["email"]),
        ] {
            let node = Node::of_kind("p", kind);
            let out = PreviewHandler::new().handle(kind, &node, &env, &ctx).await.unwrap();
            let viewports: Vec<&str> = out.output["previews"]
                .as_array()
                .unwrap()
                .iter()
                .map(|p| p["viewport"].as_str().unwrap())
                .collect();
            assert_eq!(viewports, expected);
            assert_eq!(out.output["content"], "# Title\n\nBody text");
        }
    }

    #[tokio::test]
    async fn test_suggestions_are_deterministic() {
        let sink = NoOpProgressSink;
        let ctx = DispatchContext::new("e", &sink, 0, 1);
        let env = after(json!("short text"));
        let node = Node::of_kind("p", NodeKind::LivePreview);

        let out = PreviewHandler::new()
            .handle(NodeKind::LivePreview, &node, &env, &ctx)
            .await
            .unwrap();
        let suggestions = out.output["suggestions"].as_array().unwrap();

        assert_eq!(suggestions.len(), 3);
        assert!(out.output["previews"][0]["html"].as_str().unwrap().contains("short text"));
    }

    #[tokio::test]
    async fn test_nothing_to_preview() {
        let sink = NoOpProgressSink;
        let ctx = DispatchContext::new("e", &sink, 0, 1);
        let seed = ContextEnvelope::create_initial(&NodeConfig::new(), Default::default(), CustomerContext::default(), "wf");
        let node = Node::of_kind("p", NodeKind::Preview);

        let err = PreviewHandler::new()
            .handle(NodeKind::Preview, &node, &seed, &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::MissingInput(_)));
    }
}
