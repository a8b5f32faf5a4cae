//! Node dispatch.
//!
//! Every node type string resolves to a [`NodeKind`](crate::nodes::NodeKind),
//! every kind to one of five [`NodeRole`](crate::core::NodeRole)s, and every
//! role to one [`RoleHandler`]. Unknown type strings are rejected with a
//! [`DispatchError`](crate::errors::DispatchError) before any handler runs.

mod context;
mod dispatcher;
pub mod handlers;
pub(crate) mod text_stats;

pub use context::{DispatchContext, HandlerOutput, RoleHandler};
pub use dispatcher::{NodeDispatch, NodeDispatcher};
