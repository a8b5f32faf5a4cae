//! Workflow graph data model.
//!
//! Nodes carry their type as the raw string authored in the editor. The
//! closed [`NodeKind`] catalog maps known strings to kinds and kinds to
//! their canonical [`NodeRole`](crate::core::NodeRole).

mod kind;
mod node;

pub use kind::NodeKind;
pub use node::{Edge, InputField, Node, NodeConfig, Workflow};
