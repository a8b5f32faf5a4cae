//! Prompt templates for process nodes.
//!
//! Templates use `{{name}}` placeholders. Names resolve, in order, against the
//! user input, the node's extra string settings, and the built-ins
//! `previous_content`, `user_input`, `industry` and `tier`. A line whose
//! placeholders all resolve to nothing is dropped so prompts never carry
//! dangling labels.

use crate::envelope::InvocationView;
use crate::nodes::{NodeConfig, NodeKind};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Built-in template for a process kind.
#[must_use]
pub fn default_template(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::ContentWriter => {
            "Write engaging, well-structured content about {{topic}}.\n\
             Audience: {{audience}}\nTone: {{tone}}\nIndustry: {{industry}}\n\
             Brief:\n{{user_input}}\nBuild on this draft:\n{{previous_content}}"
        }
        NodeKind::BlogWriter => {
            "Write a complete blog post with a title, introduction, headed sections and conclusion.\n\
             Topic: {{topic}}\nAudience: {{audience}}\nTone: {{tone}}\nKeywords: {{keywords}}\n\
             Brief:\n{{user_input}}\nResearch notes:\n{{previous_content}}"
        }
        NodeKind::SeoOptimizer => {
            "Optimize the following content for search engines. Improve headings, keyword \
             placement and meta description without changing its meaning.\n\
             Target keywords: {{keywords}}\n\nContent:\n{{previous_content}}"
        }
        NodeKind::EmailWriter => {
            "Write a marketing email with a subject line, body and call to action.\n\
             Topic: {{topic}}\nAudience: {{audience}}\nTone: {{tone}}\n\
             Brief:\n{{user_input}}\nSource material:\n{{previous_content}}"
        }
        NodeKind::SocialMediaWriter => {
            "Write social media posts for {{platform}} about {{topic}}. Keep them concise and \
             include relevant hashtags.\nTone: {{tone}}\nBrief:\n{{user_input}}\n\
             Source material:\n{{previous_content}}"
        }
        NodeKind::ProductDescription => {
            "Write a persuasive product description for {{product_name}}.\n\
             Features: {{features}}\nAudience: {{audience}}\nIndustry: {{industry}}\n\
             Brief:\n{{user_input}}"
        }
        NodeKind::AdCopyWriter => {
            "Write three short ad copy variants with headlines and calls to action.\n\
             Product: {{product_name}}\nAudience: {{audience}}\nPlatform: {{platform}}\n\
             Brief:\n{{user_input}}\nSource material:\n{{previous_content}}"
        }
        NodeKind::Summarizer => {
            "Summarize the following content in clear, concise prose.\n\
             Length: {{length}}\n\nContent:\n{{previous_content}}"
        }
        NodeKind::Translator => {
            "Translate the following content into {{target_language}}. Preserve formatting.\n\n\
             Content:\n{{previous_content}}"
        }
        NodeKind::Rewriter => {
            "Rewrite the following content to improve clarity and flow.\n\
             Style: {{style}}\n\nContent:\n{{previous_content}}"
        }
        NodeKind::HeadlineGenerator => {
            "Generate ten compelling headlines about {{topic}}.\nTone: {{tone}}\n\
             Brief:\n{{user_input}}\nBased on:\n{{previous_content}}"
        }
        NodeKind::KeywordResearch => {
            "List the most relevant search keywords and phrases for {{topic}}, grouped by \
             search intent.\nIndustry: {{industry}}\nBrief:\n{{user_input}}"
        }
        NodeKind::ToneAdjuster => {
            "Rewrite the following content in a {{tone}} tone. Keep the facts unchanged.\n\n\
             Content:\n{{previous_content}}"
        }
        NodeKind::Researcher => {
            "Research {{topic}} and produce structured notes with key facts, statistics and \
             angles worth covering.\nIndustry: {{industry}}\nBrief:\n{{user_input}}"
        }
        _ => "{{prompt}}\nBrief:\n{{user_input}}\nContext:\n{{previous_content}}",
    }
}

/// Renders prompts for process nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptRenderer;

impl PromptRenderer {
    /// Creates a renderer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Renders the prompt for `kind`, prepending the node's system prompt.
    #[must_use]
    pub fn render(&self, kind: NodeKind, view: &InvocationView, node: &NodeConfig) -> String {
        let template = node
            .prompt_template
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| default_template(kind));

        let body = Self::fill(template, view, node);
        match node.system_prompt.as_deref().map(str::trim) {
            Some(system) if !system.is_empty() => format!("{system}\n\n{body}"),
            _ => body,
        }
    }

    /// Fills the placeholders of `template`.
    #[must_use]
    pub fn fill(template: &str, view: &InvocationView, node: &NodeConfig) -> String {
        let mut lines = Vec::new();
        for line in template.lines() {
            if !PLACEHOLDER.is_match(line) {
                lines.push(line.to_string());
                continue;
            }

            let mut resolved_any = false;
            let rendered = PLACEHOLDER.replace_all(line, |caps: &regex::Captures<'_>| {
                let value = resolve(&caps[1], view, node).unwrap_or_default();
                resolved_any |= !value.trim().is_empty();
                value
            });
            if resolved_any {
                lines.push(rendered.into_owned());
            } else if let Some(previous) = lines.last() {
                // A section label directly above an empty value goes too.
                if previous.ends_with(':') && !PLACEHOLDER.is_match(previous) {
                    lines.pop();
                }
            }
        }
        lines.join("\n").trim().to_string()
    }
}

fn resolve<'a>(name: &str, view: &'a InvocationView, node: &'a NodeConfig) -> Option<Cow<'a, str>> {
    if let Some(value) = view.user_value(name) {
        return Some(Cow::Owned(value));
    }
    if let Some(value) = node.setting_str(name) {
        return Some(Cow::Borrowed(value));
    }
    match name {
        "previous_content" => view.previous_content().map(Cow::Borrowed),
        "user_input" => {
            let brief: Vec<String> = view
                .user_input
                .iter()
                .filter_map(|(k, _)| view.user_value(k).map(|v| format!("- {k}: {v}")))
                .collect();
            (!brief.is_empty()).then(|| Cow::Owned(brief.join("\n")))
        }
        "industry" => view.customer_context.industry.as_deref().map(Cow::Borrowed),
        "tier" => Some(Cow::Owned(view.customer_context.tier.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{ContextEnvelope, CustomerContext, CustomerTier};
    use crate::nodes::Node;
    use serde_json::json;

    fn view(input: serde_json::Value, previous: Option<serde_json::Value>) -> InvocationView {
        let user_input = input.as_object().cloned().unwrap_or_default();
        let seed = ContextEnvelope::create_initial(
            &NodeConfig::new(),
            user_input,
            CustomerContext::new(CustomerTier::Professional).with_industry("fintech"),
            "wf",
        );
        match previous {
            Some(out) => seed
                .extend(&Node::of_kind("prev", NodeKind::ContentWriter), out)
                .extract_for_invocation(),
            None => seed.extract_for_invocation(),
        }
    }

    #[test]
    fn test_fills_user_input_and_previous_content() {
        let v = view(json!({"topic": "X"}), Some(json!({"content": "Draft text"})));
        let prompt = PromptRenderer::new().render(NodeKind::ContentWriter, &v, &NodeConfig::new());

        assert!(prompt.contains("content about X."));
        assert!(prompt.contains("Industry: fintech"));
        assert!(prompt.contains("Draft text"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_drops_lines_with_nothing_to_say() {
        let v = view(json!({"topic": "X"}), None);
        let prompt = PromptRenderer::new().render(NodeKind::ContentWriter, &v, &NodeConfig::new());

        assert!(!prompt.contains("Audience:"));
        assert!(!prompt.contains("Build on this draft:"));
        assert!(prompt.contains("- topic: X"));
    }

    #[test]
    fn test_custom_template_and_system_prompt() {
        let v = view(json!({"name": "Ada"}), None);
        let mut node = NodeConfig::new().with_setting("greeting", json!("Hello"));
        node.prompt_template = Some("{{ greeting }}, {{name}}!".into());
        node.system_prompt = Some("You are terse.".into());

        let prompt = PromptRenderer::new().render(NodeKind::AiProcess, &v, &node);
        assert_eq!(prompt, "You are terse.\n\nHello, Ada!");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let v = view(json!({"topic": "X", "tone": "formal"}), Some(json!("prior")));
        let node = NodeConfig::new();
        let renderer = PromptRenderer::new();
        assert_eq!(
            renderer.render(NodeKind::BlogWriter, &v, &node),
            renderer.render(NodeKind::BlogWriter, &v, &node)
        );
    }
}
