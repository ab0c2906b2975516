//! `PlanTaskQueue`: a bounded-by-nothing, plain-FIFO MPMC queue feeding the
//! worker pool (§4.2). Deliberately does not deduplicate — that is
//! `PlanCache::try_claim`'s job — so queue semantics stay a simple
//! `Mutex`+`Condvar`-guarded deque rather than needing its own identity
//! tracking.
//!
//! The work unit here ("lower one module instance") is irregular and
//! recursive: workers discover new keys while planning and push them back
//! onto the same queue, and a worker whose children aren't planned yet
//! re-enqueues its own continuation rather than blocking on them (§5). That
//! rules out a data-parallel iterator library that assumes a `Vec<T>`
//! partitioned up front — see DESIGN.md for the note on dropping `rayon`
//! from the dependency set in favor of this hand-rolled queue.
//!
//! Generic over the queued item `T` (in this crate, [`crate::driver::WorkItem`])
//! rather than hardcoded to a bare `PlanKey`: a queue entry must carry enough
//! state for a worker to resume a partially-completed module (its plan and
//! lowering artifacts), not just identify it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

#[derive(Default)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

pub struct PlanTaskQueue<T> {
    state: Mutex<QueueState<T>>,
    cv: Condvar,
}

impl<T> Default for PlanTaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PlanTaskQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            cv: Condvar::new(),
        }
    }

    /// Unbounded enqueue; always succeeds unless the queue is closed, in
    /// which case the push is silently dropped (workers are shutting down).
    pub fn push(&self, item: T) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return;
        }
        state.items.push_back(item);
        self.cv.notify_one();
    }

    /// Non-blocking push; returns `false` if the queue is closed.
    pub fn try_push(&self, item: T) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return false;
        }
        state.items.push_back(item);
        self.cv.notify_one();
        true
    }

    pub fn try_pop(&self) -> Option<T> {
        let mut state = self.state.lock().unwrap();
        state.items.pop_front()
    }

    /// Blocks until an item is available, the queue is closed and drained,
    /// or `cancel_flag` becomes `true`. Returns `None` in the latter two
    /// cases.
    pub fn wait_pop(&self, cancel_flag: Option<&AtomicBool>) -> Option<T> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            if let Some(flag) = cancel_flag {
                if flag.load(Ordering::SeqCst) {
                    return None;
                }
            }
            let (guard, timeout) = self
                .cv
                .wait_timeout(state, std::time::Duration::from_millis(50))
                .unwrap();
            state = guard;
            let _ = timeout;
        }
    }

    /// No further pushes are accepted; `wait_pop` drains remaining items
    /// then returns `None`.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        self.cv.notify_all();
    }

    pub fn closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn drain(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        let count = state.items.len();
        state.items.clear();
        count
    }

    pub fn size(&self) -> usize {
        self.state.lock().unwrap().items.len()
    }

    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.items.clear();
        state.closed = false;
    }
}
