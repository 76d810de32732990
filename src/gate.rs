// =============================================================================
// Execution Gate — at most one running algorithm invocation at a time
// =============================================================================
//
// Admission is an atomic compare-and-swap, never a plain flag read-then-write.
// A successful admission yields an `AdmissionPermit`; the gate returns to idle
// when the permit drops, so the slot is released even if the run fails or
// panics.
// =============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Poll interval for persistent admission.
const RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// Single-slot admission gate for algorithm runs. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct ExecutionGate {
    running: Arc<AtomicBool>,
}

impl ExecutionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Best-effort admission: atomically transition idle → running. Returns
    /// `None` immediately when a run is already admitted.
    pub fn try_admit(&self) -> Option<AdmissionPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then(|| AdmissionPermit {
                running: Arc::clone(&self.running),
            })
    }

    /// Persistent admission: retry until the gate is free. Never gives up,
    /// only delays.
    pub async fn admit_blocking(&self) -> AdmissionPermit {
        loop {
            if let Some(permit) = self.try_admit() {
                return permit;
            }
            tokio::time::sleep(RETRY_INTERVAL).await;
        }
    }

    /// Whether a run currently holds the gate.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Exclusive permission to run the algorithm. Dropping the permit returns the
/// gate to idle.
#[derive(Debug)]
pub struct AdmissionPermit {
    running: Arc<AtomicBool>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_admission_fails_while_held() {
        let gate = ExecutionGate::new();

        let permit = gate.try_admit();
        assert!(permit.is_some());
        assert!(gate.is_running());
        assert!(gate.try_admit().is_none());

        drop(permit);
        assert!(!gate.is_running());
        assert!(gate.try_admit().is_some());
    }

    #[test]
    fn concurrent_contenders_admit_exactly_one() {
        let gate = ExecutionGate::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                std::thread::spawn(move || gate.try_admit().is_some())
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&admitted| admitted)
            .count();
        assert_eq!(admitted, 1);
        assert!(gate.is_running());
    }

    #[test]
    fn permit_released_on_panic() {
        let gate = ExecutionGate::new();

        let worker = {
            let gate = gate.clone();
            std::thread::spawn(move || {
                let _permit = gate.try_admit().unwrap();
                panic!("algorithm blew up");
            })
        };
        assert!(worker.join().is_err());

        // The panicking holder released the gate during unwind.
        assert!(!gate.is_running());
        assert!(gate.try_admit().is_some());
    }

    #[tokio::test]
    async fn admit_blocking_waits_for_release() {
        let gate = ExecutionGate::new();
        let permit = gate.try_admit().unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move {
                let _permit = gate.admit_blocking().await;
                true
            })
        };

        // Give the waiter time to start polling, then free the gate.
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!waiter.is_finished());
        drop(permit);

        assert!(waiter.await.unwrap());
    }
}
