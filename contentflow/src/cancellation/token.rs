//! Per-run cancellation token.

use crate::utils::{now_utc, Timestamp};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Callback invoked once when a stop is requested.
pub type StopCallback = Box<dyn Fn(&StopRequest) + Send + Sync>;

/// A recorded stop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopRequest {
    /// Why the run was stopped.
    pub reason: String,
    /// When the stop was requested.
    pub requested_at: Timestamp,
}

/// Stop flag owned by one run.
///
/// Requests are idempotent: the first reason is kept and later requests are
/// ignored.
#[derive(Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
    request: RwLock<Option<StopRequest>>,
    callbacks: RwLock<Vec<StopCallback>>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop. Returns true if this call set the flag.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        if self
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let request = StopRequest {
            reason: reason.into(),
            requested_at: now_utc(),
        };
        // Publishing the request and taking the callbacks share one lock with
        // `on_cancel`, so every callback is either taken here or sees the request.
        let callbacks = {
            let mut callbacks = self.callbacks.write();
            *self.request.write() = Some(request.clone());
            std::mem::take(&mut *callbacks)
        };

        for callback in &callbacks {
            invoke(callback.as_ref(), &request);
        }
        true
    }

    /// Registers a callback. It runs immediately if a stop was already requested.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: Fn(&StopRequest) + Send + Sync + 'static,
    {
        let mut callbacks = self.callbacks.write();
        if let Some(request) = self.request() {
            drop(callbacks);
            invoke(&callback, &request);
        } else {
            callbacks.push(Box::new(callback));
        }
    }

    /// Returns whether a stop has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the stop request, if any.
    #[must_use]
    pub fn request(&self) -> Option<StopRequest> {
        self.request.read().clone()
    }

    /// Returns the stop reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.request.read().as_ref().map(|r| r.reason.clone())
    }
}

fn invoke(callback: &(dyn Fn(&StopRequest) + Send + Sync), request: &StopRequest) {
    if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(request))) {
        warn!("Stop callback panicked: {:?}", e);
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish_non_exhaustive()
    }
}
