//! Per-visitor checkout flows.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use elitestore_core::{
    CheckoutAmount, CheckoutError, CheckoutFailure, CheckoutFlow, CheckoutSessionId,
};
use uuid::Uuid;

/// Default time a failed flow waits for its visitor to read the failure.
pub const DEFAULT_FAILURE_RETENTION: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Default)]
struct TrackedFlow {
    flow: CheckoutFlow,
    updated: Option<Instant>,
}

impl TrackedFlow {
    fn expired(&self, retention: Duration) -> bool {
        !self.flow.is_requesting()
            && self
                .updated
                .is_none_or(|updated| updated.elapsed() >= retention)
    }
}

/// Checkout flows keyed by visitor.
///
/// The lock is only held for synchronous state transitions, never across
/// the session-creation request. Settled flows older than the retention
/// period are pruned on every [`CheckoutRegistry::begin`] and by
/// [`CheckoutRegistry::prune_settled`].
#[derive(Clone)]
pub struct CheckoutRegistry {
    flows: Arc<Mutex<HashMap<Uuid, TrackedFlow>>>,
    retention: Duration,
}

impl Default for CheckoutRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_RETENTION)
    }
}

impl CheckoutRegistry {
    #[must_use]
    pub fn new(retention: Duration) -> Self {
        Self {
            flows: Arc::new(Mutex::new(HashMap::new())),
            retention,
        }
    }

    /// Start a checkout for `visitor`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InProgress`] if the visitor already has a
    /// request outstanding.
    pub fn begin(&self, visitor: Uuid, amount: CheckoutAmount) -> Result<InFlight, CheckoutError> {
        self.prune_settled();
        self.with_flow(visitor, |flow| flow.submit(amount))?;
        Ok(InFlight {
            registry: self.clone(),
            visitor,
            settled: false,
        })
    }

    /// Take the last failure for display, forgetting the flow.
    #[must_use]
    pub fn take_failure(&self, visitor: Uuid) -> Option<CheckoutFailure> {
        let mut flows = self.lock();
        let failure = flows.get_mut(&visitor)?.flow.take_failure();
        if failure.is_some() {
            flows.remove(&visitor);
        }
        failure
    }

    /// Forget settled flows older than the retention period, returning how
    /// many were dropped. Outstanding requests are never pruned.
    pub fn prune_settled(&self) -> usize {
        let retention = self.retention;
        let mut flows = self.lock();
        let before = flows.len();
        flows.retain(|_, tracked| !tracked.expired(retention));
        let pruned = before - flows.len();
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned settled checkout flows");
        }
        pruned
    }

    /// Number of visitors with a tracked flow.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_flow<R>(&self, visitor: Uuid, f: impl FnOnce(&mut CheckoutFlow) -> R) -> R {
        let mut flows = self.lock();
        let tracked = flows.entry(visitor).or_default();
        tracked.updated = Some(Instant::now());
        f(&mut tracked.flow)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, TrackedFlow>> {
        self.flows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An outstanding session-creation request.
///
/// Must be settled with [`InFlight::succeed`] or [`InFlight::fail`].
/// Dropping it unsettled (e.g. the client disconnected and the handler
/// future was cancelled) marks the flow `Failed(Cancelled)`.
#[must_use = "an unsettled checkout is recorded as cancelled"]
pub struct InFlight {
    registry: CheckoutRegistry,
    visitor: Uuid,
    settled: bool,
}

impl InFlight {
    /// The backend issued a session; the flow is finished on our side.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] if the flow was changed
    /// underneath this request.
    pub fn succeed(mut self, session_id: CheckoutSessionId) -> Result<(), CheckoutError> {
        self.settled = true;
        let mut flows = self.registry.lock();
        let result = flows
            .entry(self.visitor)
            .or_default()
            .flow
            .session_created(session_id);
        // Redirecting is terminal here: the hosted page takes over.
        flows.remove(&self.visitor);
        result
    }

    /// The attempt failed.
    pub fn fail(mut self, failure: CheckoutFailure) {
        self.settled = true;
        self.record_failure(failure);
    }

    fn record_failure(&self, failure: CheckoutFailure) {
        let result = self
            .registry
            .with_flow(self.visitor, |flow| flow.fail(failure));
        if let Err(e) = result {
            tracing::warn!(
                visitor = %self.visitor,
                error = %e,
                "Could not record checkout failure"
            );
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.settled {
            tracing::info!(visitor = %self.visitor, "Checkout request cancelled");
            self.record_failure(CheckoutFailure::Cancelled);
        }
    }
}
