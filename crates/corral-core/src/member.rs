//! Membership records and the per-member parking token.

use std::sync::{Arc, Condvar, Mutex};

use corral_common::types::{ContainerId, RunState, ThreadId};

use crate::sync::lock_unpoisoned;

/// Per-member parking primitive.
///
/// A waiter carries a single wake permit. `park` consumes the permit,
/// blocking until one is available; `wake` deposits one and notifies.
/// Waking before the parked thread reaches `park` is therefore harmless:
/// the permit is consumed on arrival and the thread proceeds immediately.
#[derive(Debug, Default)]
pub struct Waiter {
    permit: Mutex<bool>,
    cv: Condvar,
}

impl Waiter {
    /// Creates a waiter with no pending permit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks the calling thread until a wake permit arrives, then
    /// consumes it. Unbounded by design: the scheduling model is purely
    /// cooperative and offers no timeout or cancellation path.
    pub fn park(&self) {
        let mut permit = lock_unpoisoned(&self.permit);
        while !*permit {
            permit = self
                .cv
                .wait(permit)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
        *permit = false;
    }

    /// Deposits a wake permit and notifies the parked thread, if any.
    pub fn wake(&self) {
        let mut permit = lock_unpoisoned(&self.permit);
        *permit = true;
        self.cv.notify_one();
    }
}

/// A thread's participation record within one container.
///
/// Owned exclusively by the container that holds it; created on `join`,
/// destroyed on `leave`.
#[derive(Debug)]
pub struct Member {
    thread_id: ThreadId,
    // Denormalized for diagnostics; the list owning this record is the
    // authoritative source of membership.
    container_id: ContainerId,
    state: RunState,
    waiter: Arc<Waiter>,
}

impl Member {
    /// Creates a new record in the given run state.
    #[must_use]
    pub fn new(thread_id: ThreadId, container_id: ContainerId, state: RunState) -> Self {
        Self {
            thread_id,
            container_id,
            state,
            waiter: Arc::new(Waiter::new()),
        }
    }

    /// Identity of the member thread.
    #[must_use]
    pub const fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Id of the container this record belongs to.
    #[must_use]
    pub const fn container_id(&self) -> ContainerId {
        self.container_id
    }

    /// Current run state.
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Transitions the member to a new run state.
    pub fn set_state(&mut self, state: RunState) {
        self.state = state;
    }

    /// A clone of this member's parking token.
    #[must_use]
    pub fn waiter(&self) -> Arc<Waiter> {
        Arc::clone(&self.waiter)
    }
}
