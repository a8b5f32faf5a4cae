use super::previous_text;
use crate::config::EngineConfig;
use crate::core::NodeRole;
use crate::dispatch::text_stats::heuristic_quality_score;
use crate::dispatch::{DispatchContext, HandlerOutput, RoleHandler};
use crate::envelope::ContextEnvelope;
use crate::errors::NodeError;
use crate::nodes::{Node, NodeKind};
use crate::output::checksum;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const CONTINUE: &str = "continue";
const RETURN_FOR_REVISION: &str = "return-for-revision";

/// How a metric is compared against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOperator {
    /// Greater than or equal.
    #[default]
    Gte,
    /// Strictly greater.
    Gt,
    /// Less than or equal.
    Lte,
    /// Strictly less.
    Lt,
    /// Equal within `f64::EPSILON`.
    Eq,
}

impl ComparisonOperator {
    /// Parses an operator name or symbol.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "gte" | ">=" => Some(Self::Gte),
            "gt" | ">" => Some(Self::Gt),
            "lte" | "<=" => Some(Self::Lte),
            "lt" | "<" => Some(Self::Lt),
            "eq" | "==" | "=" => Some(Self::Eq),
            _ => None,
        }
    }

    /// Applies the operator.
    #[must_use]
    pub fn compare(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Gte => value >= threshold,
            Self::Gt => value > threshold,
            Self::Lte => value <= threshold,
            Self::Lt => value < threshold,
            Self::Eq => (value - threshold).abs() < f64::EPSILON,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gte => write!(f, "gte"),
            Self::Gt => write!(f, "gt"),
            Self::Lte => write!(f, "lte"),
            Self::Lt => write!(f, "lt"),
            Self::Eq => write!(f, "eq"),
        }
    }
}

/// Where an evaluated value came from.
enum Measured {
    Score(f64),
    Flag(bool),
}

/// Evaluates a gate over the previous output and records a decision.
///
/// The decision is informational: the executor always moves on to the next
/// node. The previous content is passed through unchanged.
#[derive(Debug, Clone)]
pub struct ConditionHandler {
    config: Arc<EngineConfig>,
}

impl ConditionHandler {
    /// Creates a handler.
    #[must_use]
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    fn default_metric(kind: NodeKind) -> &'static str {
        match kind {
            NodeKind::ApprovalGate => "approved",
            _ => "qualityScore",
        }
    }

    fn measure(previous: Option<&Value>, metric: &str) -> Option<Measured> {
        match previous?.get(metric)? {
            Value::Bool(b) => Some(Measured::Flag(*b)),
            Value::Number(n) => n.as_f64().map(Measured::Score),
            Value::String(s) => s.trim().parse().ok().map(Measured::Score),
            _ => None,
        }
    }

    fn ab_variant(node: &Node, execution_id: &str) -> Value {
        let variants: Vec<Value> = node
            .data
            .extra
            .get("variants")
            .and_then(Value::as_array)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| vec![json!("A"), json!("B")]);

        let digest = checksum(&format!("{execution_id}:{}", node.id));
        let bucket = usize::from_str_radix(&digest[..8], 16).unwrap_or(0);
        variants[bucket % variants.len()].clone()
    }
}

#[async_trait]
impl RoleHandler for ConditionHandler {
    fn role(&self) -> NodeRole {
        NodeRole::Condition
    }

    async fn handle(
        &self,
        kind: NodeKind,
        node: &Node,
        envelope: &ContextEnvelope,
        ctx: &DispatchContext<'_>,
    ) -> Result<HandlerOutput, NodeError> {
        let content = previous_text(envelope).unwrap_or_default();

        if kind == NodeKind::AbTest {
            let variant = Self::ab_variant(node, ctx.execution_id);
            return Ok(HandlerOutput::new(json!({
                "content": content,
                "decision": CONTINUE,
                "passed": true,
                "variant": variant,
            }))
            .with_metadata("variant", variant));
        }

        let metric = node
            .data
            .setting_str("metric")
            .unwrap_or_else(|| Self::default_metric(kind));
        let threshold = match node.data.extra.get("threshold") {
            None | Some(Value::Null) => self.config.quality_threshold,
            Some(_) => node.data.setting_f64("threshold").ok_or_else(|| {
                NodeError::InvalidConfig(format!("threshold of '{}' is not a number", node.id))
            })?,
        };
        let operator = match node.data.setting_str("operator") {
            None => ComparisonOperator::default(),
            Some(op) => ComparisonOperator::parse(op).ok_or_else(|| {
                NodeError::InvalidConfig(format!("unknown operator '{op}' on '{}'", node.id))
            })?,
        };

        let measured = Self::measure(envelope.current_node_output.as_ref(), metric);
        let (passed, score, source) = match measured {
            Some(Measured::Flag(flag)) => (flag, Value::Bool(flag), "metric"),
            Some(Measured::Score(value)) => {
                (operator.compare(value, threshold), json!(value), "metric")
            }
            None if kind == NodeKind::ApprovalGate => (false, Value::Null, "awaiting_approval"),
            None => {
                let value = heuristic_quality_score(&content, self.config.heuristic_target_words);
                (operator.compare(value, threshold), json!(value), "heuristic")
            }
        };
        let decision = if passed { CONTINUE } else { RETURN_FOR_REVISION };

        debug!(
            node_id = %node.id,
            metric,
            threshold,
            operator = %operator,
            passed,
            source,
            "Condition evaluated"
        );

        Ok(HandlerOutput::new(json!({
            "content": content,
            "decision": decision,
            "passed": passed,
            "metric": metric,
            "score": score,
            "threshold": threshold,
            "operator": operator,
        }))
        .with_metadata("decision", json!(decision))
        .with_metadata("scoreSource", json!(source)))
    }
}
