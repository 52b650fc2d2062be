//! Shared callback context and the teardown quiescence gate

use crate::handler::{PipelineHandler, PipelineId};
use crate::pipeline::Role;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

/// Per-pipeline record carried across callback boundaries
///
/// Created when the pipeline starts and shared read-only by every
/// callback it dispatches. The gate guarantees the record outlives the
/// last in-flight callback: destroy drains before releasing it.
pub struct CallbackContext {
    /// Caller-assigned pipeline identifier
    pub id: PipelineId,
    /// Role driving the bus watcher's end-of-stream handling
    pub role: Role,
    /// Caller-supplied callback implementation
    pub handler: Arc<dyn PipelineHandler>,
    /// Quiescence gate entered around every dispatched callback
    pub gate: QuiesceGate,
}

impl CallbackContext {
    pub fn new(id: PipelineId, role: Role, handler: Arc<dyn PipelineHandler>) -> Self {
        CallbackContext {
            id,
            role,
            handler,
            gate: QuiesceGate::new(),
        }
    }
}

impl std::fmt::Debug for CallbackContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackContext")
            .field("id", &self.id)
            .field("role", &self.role)
            .finish()
    }
}

/// Gate tracking callbacks in flight
///
/// Dispatchers enter before invoking a caller callback and the returned
/// guard leaves on drop. `drain` flips the gate shut and blocks until
/// the active count reaches zero; entries after that are refused.
#[derive(Debug, Clone)]
pub struct QuiesceGate {
    shared: Arc<GateState>,
}

#[derive(Debug)]
struct GateState {
    draining: AtomicBool,
    active: Mutex<usize>,
    condvar: Condvar,
}

impl QuiesceGate {
    pub fn new() -> QuiesceGate {
        QuiesceGate {
            shared: Arc::new(GateState {
                draining: AtomicBool::new(false),
                active: Mutex::new(0),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Enter the gate; `None` once draining has begun
    pub fn enter(&self) -> Option<GateGuard> {
        let mut active = self.shared.active.lock().unwrap();
        if self.shared.draining.load(Ordering::Acquire) {
            return None;
        }
        *active += 1;
        Some(GateGuard {
            shared: Arc::clone(&self.shared),
        })
    }

    /// Shut the gate and block until every active guard is dropped
    pub fn drain(&self) {
        self.shared.draining.store(true, Ordering::Release);

        let mut active = self.shared.active.lock().unwrap();
        while *active > 0 {
            active = self.shared.condvar.wait(active).unwrap();
        }
    }

    pub fn is_draining(&self) -> bool {
        self.shared.draining.load(Ordering::Acquire)
    }
}

impl Default for QuiesceGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Hold of one in-flight callback; leaving happens on drop
pub struct GateGuard {
    shared: Arc<GateState>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        let mut active = self.shared.active.lock().unwrap();
        *active -= 1;
        if *active == 0 {
            self.shared.condvar.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn enter_is_refused_while_draining() {
        let gate = QuiesceGate::new();
        assert!(gate.enter().is_some());

        gate.drain();
        assert!(gate.is_draining());
        assert!(gate.enter().is_none());
    }

    #[test]
    fn drain_waits_for_active_guards() {
        let gate = QuiesceGate::new();
        let guard = gate.enter().unwrap();

        let drainer = gate.clone();
        let handle = thread::spawn(move || {
            drainer.drain();
        });

        // the drainer must still be blocked on the held guard
        thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());

        drop(guard);
        handle.join().unwrap();
    }

    #[test]
    fn concurrent_guards_all_release() {
        let gate = QuiesceGate::new();
        let mut workers = Vec::new();
        for _ in 0..8 {
            let gate = gate.clone();
            workers.push(thread::spawn(move || {
                if let Some(_guard) = gate.enter() {
                    thread::sleep(Duration::from_millis(10));
                }
            }));
        }

        thread::sleep(Duration::from_millis(5));
        gate.drain();
        for worker in workers {
            worker.join().unwrap();
        }
        assert!(gate.enter().is_none());
    }
}
