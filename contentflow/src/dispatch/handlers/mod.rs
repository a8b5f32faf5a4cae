//! The five role handlers.

mod condition;
mod input;
mod output;
mod preview;
mod process;

pub use condition::{ComparisonOperator, ConditionHandler};
pub use input::InputHandler;
pub use output::OutputHandler;
pub use preview::PreviewHandler;
pub use process::ProcessHandler;

use crate::envelope::ContextEnvelope;

/// The text the previous node produced, falling back to its JSON form.
pub(crate) fn previous_text(envelope: &ContextEnvelope) -> Option<String> {
    if let Some(content) = envelope.latest_content() {
        return Some(content.to_string());
    }
    match envelope.current_node_output.as_ref()? {
        serde_json::Value::Null => None,
        other => serde_json::to_string_pretty(other).ok(),
    }
}
