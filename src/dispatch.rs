// =============================================================================
// Dispatcher — admits and spawns algorithm runs
// =============================================================================
//
// Every run executes in its own tokio task holding an `AdmissionPermit`. The
// permit drops when the task finishes, fails, times out, or panics, so the
// gate can never stay wedged behind a dead run.
// =============================================================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::algo::{AlgoContext, Algorithm};
use crate::gate::{AdmissionPermit, ExecutionGate};
use crate::types::TriggerCause;

/// Admission front-end for the two trigger paths: best-effort (feed) and
/// persistent (remote).
pub struct Dispatcher {
    gate: ExecutionGate,
    algorithm: Arc<dyn Algorithm>,
    ctx: AlgoContext,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(
        algorithm: Arc<dyn Algorithm>,
        ctx: AlgoContext,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            gate: ExecutionGate::new(),
            algorithm,
            ctx,
            timeout,
        }
    }

    pub fn gate(&self) -> &ExecutionGate {
        &self.gate
    }

    /// Feed-triggered admission: skip if a run is already in flight. Returns
    /// whether a run was spawned.
    pub fn trigger_best_effort(&self, cause: TriggerCause) -> bool {
        match self.gate.try_admit() {
            Some(permit) => {
                self.spawn_run(permit, cause);
                true
            }
            None => {
                debug!(cause = %cause, "algorithm busy, trigger dropped");
                false
            }
        }
    }

    /// Remote-triggered admission: never dropped, only delayed. The wait for
    /// the gate happens inside the spawned task, so the caller (the gateway
    /// loop) can reply immediately.
    pub fn trigger_persistent(&self, cause: TriggerCause) {
        let gate = self.gate.clone();
        let algorithm = Arc::clone(&self.algorithm);
        let ctx = self.ctx.clone();
        let timeout = self.timeout;
        tokio::spawn(async move {
            let permit = gate.admit_blocking().await;
            run_algorithm(permit, algorithm, ctx, cause, timeout).await;
        });
    }

    fn spawn_run(&self, permit: AdmissionPermit, cause: TriggerCause) {
        let algorithm = Arc::clone(&self.algorithm);
        let ctx = self.ctx.clone();
        let timeout = self.timeout;
        tokio::spawn(async move {
            run_algorithm(permit, algorithm, ctx, cause, timeout).await;
        });
    }
}

/// Execute one admitted run, containing failures and enforcing the timeout.
async fn run_algorithm(
    permit: AdmissionPermit,
    algorithm: Arc<dyn Algorithm>,
    ctx: AlgoContext,
    cause: TriggerCause,
    timeout: Option<Duration>,
) {
    let _permit = permit;
    let started = Instant::now();
    debug!(cause = %cause, "algorithm run starting");

    let fut = algorithm.run(ctx, cause.clone());
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(outcome) => outcome,
            Err(_) => {
                error!(
                    cause = %cause,
                    timeout_secs = limit.as_secs(),
                    "algorithm run timed out, gate released"
                );
                return;
            }
        },
        None => fut.await,
    };

    match outcome {
        Ok(()) => debug!(
            cause = %cause,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "algorithm run finished"
        ),
        Err(e) => error!(cause = %cause, error = %e, "algorithm run failed"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
