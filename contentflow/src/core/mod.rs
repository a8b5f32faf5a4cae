//! Core domain model types for contentflow.
//!
//! This module contains the fundamental types used throughout the engine:
//! - Node role and execution status enums
//! - Progress events reported while a run is in flight
//! - Per-node results and AI usage metadata

mod event;
mod result;
mod status;

pub(crate) use event::percent;
pub use event::{ProgressEvent, ProgressStatus};
pub use result::{AiUsage, NodeResult};
pub use status::{ExecutionStatus, NodeRole};
