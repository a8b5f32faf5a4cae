//! Provider and model resolution for process nodes.

use crate::config::EngineConfig;
use crate::nodes::NodeConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The provider/model pair a node will call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelection {
    /// Provider name.
    pub provider: String,
    /// Model id.
    pub model: String,
}

impl ModelSelection {
    /// Creates a selection.
    #[must_use]
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Resolves the selection for a node.
    ///
    /// The first `selectedModels` entry wins, then `aiProvider`/`aiModel`,
    /// then the configured defaults. Blank values count as absent.
    #[must_use]
    pub fn resolve(node: &NodeConfig, defaults: &EngineConfig) -> Self {
        if let Some(entry) = node.selected_models.iter().find(|m| !m.trim().is_empty()) {
            return Self::parse(entry, &defaults.default_provider);
        }

        let provider = non_blank(node.ai_provider.as_deref());
        let model = non_blank(node.ai_model.as_deref());
        Self::new(
            provider.unwrap_or(&defaults.default_provider),
            model.unwrap_or(&defaults.default_model),
        )
    }

    /// Parses `provider:modelId`. An entry without a colon is a model id on
    /// `default_provider`.
    #[must_use]
    pub fn parse(entry: &str, default_provider: &str) -> Self {
        match entry.trim().split_once(':') {
            Some((provider, model)) if !provider.trim().is_empty() => {
                Self::new(provider.trim(), model.trim())
            }
            Some((_, model)) => Self::new(default_provider, model.trim()),
            None => Self::new(default_provider, entry.trim()),
        }
    }
}

impl fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_selected_models_first_entry_wins() {
        let mut node = NodeConfig::new()
            .with_selected_model("anthropic:claude-3-haiku")
            .with_selected_model("openai:gpt-4o");
        node.ai_provider = Some("google".into());

        let sel = ModelSelection::resolve(&node, &EngineConfig::default());
        assert_eq!(sel, ModelSelection::new("anthropic", "claude-3-haiku"));
        assert_eq!(sel.to_string(), "anthropic:claude-3-haiku");
    }

    #[test]
    fn test_explicit_provider_and_model() {
        let mut node = NodeConfig::new();
        node.ai_provider = Some("anthropic".into());
        node.ai_model = Some("claude-3-5-sonnet".into());

        let sel = ModelSelection::resolve(&node, &EngineConfig::default());
        assert_eq!(sel, ModelSelection::new("anthropic", "claude-3-5-sonnet"));
    }

    #[test]
    fn test_partial_explicit_falls_back_per_field() {
        let mut node = NodeConfig::new();
        node.ai_model = Some("gpt-4o".into());

        let sel = ModelSelection::resolve(&node, &EngineConfig::default());
        assert_eq!(sel, ModelSelection::new("openai", "gpt-4o"));
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = EngineConfig::default().with_default_model("mistral", "mistral-small");
        let sel = ModelSelection::resolve(&NodeConfig::new(), &config);
        assert_eq!(sel, ModelSelection::new("mistral", "mistral-small"));
    }

    #[test]
    fn test_entry_without_colon_uses_default_provider() {
        assert_eq!(
            ModelSelection::parse("gpt-4o", "openai"),
            ModelSelection::new("openai", "gpt-4o")
        );
        assert_eq!(
            ModelSelection::parse(":gpt-4o", "openai"),
            ModelSelection::new("openai", "gpt-4o")
        );
    }
}
