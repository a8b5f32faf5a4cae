use super::continuity::EnvelopeSnapshot;
use crate::utils::{timestamps::elapsed_ms, Timestamp};
use serde::{Deserialize, Serialize};

/// Totals computed when an envelope chain is finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    /// Timestamp of the oldest envelope in the history.
    pub started_at: Timestamp,
    /// Timestamp of the finalized envelope.
    pub completed_at: Timestamp,
    /// Wall-clock duration between the two.
    pub duration_ms: u64,
    /// Number of envelopes in the history, the seed included.
    pub total_nodes: usize,
    /// Tokens reported across the history.
    pub total_tokens: u64,
    /// Cost reported across the history.
    pub total_cost: f64,
}

impl WorkflowSummary {
    /// Sums the usage recorded in `history`.
    #[must_use]
    pub fn from_history(history: &[EnvelopeSnapshot], completed_at: Timestamp) -> Self {
        let started_at = history.first().map_or(completed_at, |s| s.timestamp);
        let (total_tokens, total_cost) = history
            .iter()
            .filter_map(|s| s.ai_usage.as_ref())
            .fold((0_u64, 0.0_f64), |(tokens, cost), usage| {
                (tokens.saturating_add(usage.tokens), cost + usage.cost)
            });

        Self {
            started_at,
            completed_at,
            duration_ms: elapsed_ms(started_at, completed_at),
            total_nodes: history.len(),
            total_tokens,
            total_cost,
        }
    }
}
