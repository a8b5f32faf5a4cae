//! # Contentflow
//!
//! A workflow execution engine for AI-assisted content pipelines.
//!
//! A workflow is an ordered list of typed nodes authored in a graph editor.
//! Contentflow runs the nodes one after another and provides:
//!
//! - **Context envelopes**: an immutable, accumulating record threaded from node to node
//! - **Role dispatch**: a closed catalog of node kinds routed to five role handlers
//! - **AI invocation**: model resolution, prompt rendering and loud failure on empty output
//! - **Output delivery**: multi-format rendering, checksums and expiring persistence
//! - **Progress and cancellation**: live progress events and stop requests at node boundaries
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use contentflow::prelude::*;
//!
//! let engine = WorkflowEngine::new(provider, store, EngineConfig::default());
//! let request = ExecutionRequest::from_workflow(&workflow)
//!     .with_input("topic", serde_json::json!("Rust in production"));
//!
//! let record = engine.execute(request, &engine.logging_sink()).await?;
//! println!("{}", record.final_output.unwrap()["content"]);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod envelope;
pub mod errors;
pub mod executor;
pub mod nodes;
pub mod observability;
pub mod output;
pub mod progress;
pub mod providers;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{EngineConfig, HttpProviderConfig};
    pub use crate::core::{
        AiUsage, ExecutionStatus, NodeResult, NodeRole, ProgressEvent, ProgressStatus,
    };
    pub use crate::envelope::{ContextEnvelope, CustomerContext, CustomerTier, UserInput};
    pub use crate::errors::{
        ContentflowError, DispatchError, ExecutionError, NodeError, ProviderError,
        StorageError, WrappedNodeError,
    };
    pub use crate::executor::{ExecutionRecord, ExecutionRequest, PipelineExecutor, WorkflowEngine};
    pub use crate::nodes::{Node, NodeConfig, NodeKind, Workflow};
    pub use crate::output::{ExecutionStore, InMemoryExecutionStore, OutputFormat};
    pub use crate::progress::{
        CollectingProgressSink, FnProgressSink, LoggingProgressSink, NoOpProgressSink,
        ProgressSink,
    };
    #[cfg(feature = "http")]
    pub use crate::providers::HttpGenerationProvider;
    pub use crate::providers::{GenerationProvider, GenerationRequest, GenerationResponse};
    pub use crate::utils::{generate_uuid, iso_timestamp, Timestamp};
}
