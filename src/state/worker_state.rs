//! Worker busy/idle tracking for quiescence detection
//!
//! Each worker owns exactly one slot and is the only writer to it. The
//! quiescence detector only ever reads.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// The observable state of a single fetch worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Worker has pulled a URL and is processing it
    Busy,

    /// Worker finished its last URL (or has not started one) at this instant
    IdleSince(Instant),
}

impl WorkerState {
    /// Returns true if the worker is processing a URL
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }

    /// How long the worker has been idle as of `now`, or None while busy
    pub fn idle_for(&self, now: Instant) -> Option<Duration> {
        match self {
            Self::Busy => None,
            Self::IdleSince(since) => Some(now.saturating_duration_since(*since)),
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "busy"),
            Self::IdleSince(since) => write!(f, "idle for {:?}", since.elapsed()),
        }
    }
}

/// Busy/idle records for every worker in a pool
#[derive(Debug)]
pub struct WorkerStates {
    slots: Vec<Mutex<WorkerState>>,
}

impl WorkerStates {
    /// Creates records for `count` workers, all idle as of now
    pub fn new(count: usize) -> Self {
        let now = Instant::now();
        Self {
            slots: (0..count)
                .map(|_| Mutex::new(WorkerState::IdleSince(now)))
                .collect(),
        }
    }

    /// Number of tracked workers
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no workers are tracked
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the current state of a worker
    pub fn get(&self, worker: usize) -> Option<WorkerState> {
        self.slots.get(worker).map(|slot| *slot.lock().unwrap())
    }

    /// Returns the state of every worker, in worker order
    pub fn snapshot(&self) -> Vec<WorkerState> {
        self.slots.iter().map(|slot| *slot.lock().unwrap()).collect()
    }

    /// Returns true if every worker has been idle for at least `threshold` as of `now`
    ///
    /// With zero workers this is vacuously true; callers reject that
    /// configuration before a pool is ever built.
    pub fn all_idle_for(&self, threshold: Duration, now: Instant) -> bool {
        self.slots.iter().all(|slot| {
            slot.lock()
                .unwrap()
                .idle_for(now)
                .is_some_and(|idle| idle >= threshold)
        })
    }

    /// Hands out the write handle for one worker's record
    ///
    /// The pool calls this once per worker at start-up.
    pub fn slot(self: &Arc<Self>, worker: usize) -> Option<WorkerSlot> {
        (worker < self.slots.len()).then(|| WorkerSlot {
            states: Arc::clone(self),
            worker,
        })
    }

    fn set(&self, worker: usize, state: WorkerState) {
        if let Some(slot) = self.slots.get(worker) {
            *slot.lock().unwrap() = state;
        }
    }
}

/// Write handle for a single worker's record
#[derive(Debug)]
pub struct WorkerSlot {
    states: Arc<WorkerStates>,
    worker: usize,
}

impl WorkerSlot {
    /// The worker number this slot belongs to
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Marks the worker busy
    pub fn mark_busy(&self) {
        self.states.set(self.worker, WorkerState::Busy);
    }

    /// Marks the worker idle as of now
    pub fn mark_idle(&self) {
        self.states
            .set(self.worker, WorkerState::IdleSince(Instant::now()));
    }
}
