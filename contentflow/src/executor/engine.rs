//! Coordinator owning the executor and the stop tokens of active runs.

use super::{ExecutionRecord, ExecutionRequest, PipelineExecutor};
use crate::cancellation::{CancellationToken, StopRequest};
use crate::config::EngineConfig;
use crate::dispatch::{NodeDispatch, NodeDispatcher};
use crate::errors::{ExecutionError, StorageError};
use crate::output::{ExecutionStore, PersistedArtifact};
use crate::progress::{LoggingProgressSink, ProgressSink};
use crate::providers::GenerationProvider;
use crate::utils::generate_uuid_v7;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::join_all;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// Observer told about every accepted stop request, with the run's execution id.
pub type StopListener = Arc<dyn Fn(&str, &StopRequest) + Send + Sync>;

/// Runs workflows and lets callers stop them by execution id.
pub struct WorkflowEngine {
    executor: PipelineExecutor,
    store: Arc<dyn ExecutionStore>,
    config: Arc<EngineConfig>,
    active: DashMap<String, Arc<CancellationToken>>,
    stop_listeners: RwLock<Vec<StopListener>>,
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("config", &self.config)
            .field("active", &self.active.len())
            .field("stop_listeners", &self.stop_listeners.read().len())
            .finish_non_exhaustive()
    }
}

impl WorkflowEngine {
    /// Creates an engine with the built-in node handlers.
    #[must_use]
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        store: Arc<dyn ExecutionStore>,
        config: EngineConfig,
    ) -> Self {
        let config = Arc::new(config);
        let dispatcher = NodeDispatcher::new(provider, Arc::clone(&store), Arc::clone(&config));
        Self::with_dispatcher(Arc::new(dispatcher), store, config)
    }

    /// Creates an engine over a custom dispatcher.
    #[must_use]
    pub fn with_dispatcher(
        dispatcher: Arc<dyn NodeDispatch>,
        store: Arc<dyn ExecutionStore>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            executor: PipelineExecutor::new(dispatcher),
            store,
            config,
            active: DashMap::new(),
            stop_listeners: RwLock::new(Vec::new()),
        }
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A progress sink logging at the configured `progress_log_level`.
    #[must_use]
    pub fn logging_sink(&self) -> LoggingProgressSink {
        LoggingProgressSink::from_config(&self.config)
    }

    /// Runs a workflow to a terminal status.
    ///
    /// The run is registered under its execution id while in flight so that
    /// [`stop`](Self::stop) can reach it. Set the id on the request to know
    /// it before the run starts.
    ///
    /// # Errors
    ///
    /// [`ExecutionError::AlreadyRunning`] if a run with the same execution id
    /// is in flight; it is left untouched. Otherwise see [`PipelineExecutor::run`].
    pub async fn execute(
        &self,
        mut request: ExecutionRequest,
        progress: &dyn ProgressSink,
    ) -> Result<ExecutionRecord, ExecutionError> {
        let execution_id = request
            .execution_id
            .get_or_insert_with(|| generate_uuid_v7().to_string())
            .clone();
        let token = match self.active.entry(execution_id.clone()) {
            Entry::Occupied(_) => {
                warn!(execution_id = %execution_id, "Execution id already in flight");
                return Err(ExecutionError::AlreadyRunning {
                    record: Box::new(ExecutionRecord::rejected(
                        execution_id,
                        request.workflow_id,
                    )),
                });
            }
            Entry::Vacant(slot) => {
                let token = Arc::new(CancellationToken::new());
                slot.insert(Arc::clone(&token));
                token
            }
        };
        self.watch_stop(&execution_id, &token);

        let outcome = self.executor.run(request, progress, &token).await;

        self.active.remove(&execution_id);
        outcome
    }

    /// Runs independent workflows concurrently on the current task.
    ///
    /// Results come back in request order. Every run owns its record and
    /// envelope chain; only the provider and store are shared.
    pub async fn execute_batch(
        &self,
        requests: Vec<ExecutionRequest>,
        progress: &dyn ProgressSink,
    ) -> Vec<Result<ExecutionRecord, ExecutionError>> {
        info!(runs = requests.len(), "Executing workflow batch");
        join_all(requests.into_iter().map(|request| self.execute(request, progress))).await
    }

    /// Requests that a run stop at its next node boundary.
    ///
    /// Returns false if no such run is active or it was already stopped.
    pub fn stop(&self, execution_id: &str, reason: impl Into<String>) -> bool {
        let Some(token) = self.active.get(execution_id).map(|t| Arc::clone(t.value())) else {
            return false;
        };
        token.cancel(reason)
    }

    /// Registers a listener for stop requests on runs started afterwards.
    pub fn on_stop<F>(&self, listener: F)
    where
        F: Fn(&str, &StopRequest) + Send + Sync + 'static,
    {
        self.stop_listeners.write().push(Arc::new(listener));
    }

    fn watch_stop(&self, execution_id: &str, token: &CancellationToken) {
        let id = execution_id.to_string();
        token.on_cancel(move |request| {
            info!(
                execution_id = %id,
                reason = %request.reason,
                requested_at = %request.requested_at,
                "Stop requested"
            );
        });
        for listener in self.stop_listeners.read().iter() {
            let listener = Arc::clone(listener);
            let id = execution_id.to_string();
            token.on_cancel(move |request| listener(&id, request));
        }
    }

    /// Ids of runs currently in flight.
    #[must_use]
    pub fn active_executions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.active.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Loads the persisted output of a completed run.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn load_output(
        &self,
        execution_id: &str,
    ) -> Result<Option<PersistedArtifact>, StorageError> {
        self.store.load(execution_id).await
    }

    /// Removes expired artifacts from the store.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn purge_expired(&self) -> Result<usize, StorageError> {
        self.store.purge_expired().await
    }
}
