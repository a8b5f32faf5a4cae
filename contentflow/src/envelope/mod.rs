//! The context envelope threaded between nodes.
//!
//! This module provides:
//! - The versioned [`ContextEnvelope`] and its constructors
//! - Continuity data recording every prior node
//! - The customer context shared unchanged by the whole chain
//! - The [`InvocationView`] projection handed to the AI adapter

mod continuity;
mod customer;
#[allow(clippy::module_inception)]
mod envelope;
#[cfg(test)]
mod envelope_tests;
mod summary;

pub use continuity::{ContinuityData, EnvelopeSnapshot, PreviousNode};
pub use customer::{CustomerContext, CustomerTier, UserInput};
pub use envelope::{
    content_of, ContextEnvelope, EnvelopeMetadata, ExtensionBundle, InvocationMetadata,
    InvocationView, PreviousContext, ValidationReport, ENVELOPE_VERSION, SEED_NODE_ID,
    SEED_NODE_TYPE,
};
pub use summary::WorkflowSummary;
