//! Cooperative scheduling over the container directory.
//!
//! All directory, membership, and arena mutation happens under one mutex.
//! The lock is released before a joining thread parks and re-acquired
//! only by later calls, so a parked thread never holds the directory.
//! Wakes are issued strictly after the owning mutation has committed:
//! a woken thread always observes itself runnable.

use std::sync::{Arc, Mutex};

use corral_common::error::{CorralError, Result};
use corral_common::types::{ContainerId, ObjectId, RunState, ThreadId};

use crate::arena::BlockHandle;
use crate::directory::{ContainerDirectory, DirectorySnapshot};
use crate::member::Waiter;
use crate::membership::{Appended, RemovalOutcome};
use crate::sync::lock_unpoisoned;

/// Handle to one scheduling domain.
///
/// Cloning is cheap and shares the underlying directory; every OS thread
/// participating in the protocol calls through its own clone.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    directory: Arc<Mutex<ContainerDirectory>>,
}

impl Scheduler {
    /// Creates a scheduler over an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the calling thread to the container with the given id,
    /// creating the container if necessary.
    ///
    /// Returns only once the caller is runnable: immediately for a
    /// container's first member, otherwise after parking until a later
    /// `leave` or `rotate` elects the caller. Blocking is unbounded by
    /// design; the model is purely cooperative.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Invalid`] if the thread already belongs to
    /// a container — a thread is a member of at most one at a time.
    pub fn join(&self, caller: ThreadId, container: ContainerId) -> Result<()> {
        let parked: Option<Arc<Waiter>> = {
            let mut dir = lock_unpoisoned(&self.directory);
            if let Some(current) = dir.container_of(caller) {
                return Err(CorralError::Invalid {
                    message: format!("thread {caller} is already a member of container {current}"),
                });
            }
            let target = dir.find_or_create(container);
            match target.members.append(caller, container) {
                Appended::FirstRunnable => {
                    tracing::debug!(thread = %caller, container = %container, "joined as first member");
                    None
                }
                Appended::Parked(waiter) => {
                    tracing::debug!(thread = %caller, container = %container, "joined suspended");
                    Some(waiter)
                }
            }
        };

        if let Some(waiter) = parked {
            waiter.park();
            tracing::debug!(thread = %caller, container = %container, "elected runnable");
        }
        Ok(())
    }

    /// Removes the calling thread from its container.
    ///
    /// If the caller held the running slot, its successor in join order is
    /// elected and woken. If the caller was the last member, the container
    /// is unlinked from the directory.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::NotAMember`] if the thread belongs to no
    /// container. Directory state is left unchanged in that case.
    pub fn leave(&self, caller: ThreadId) -> Result<()> {
        let woken: Option<(ThreadId, Arc<Waiter>)> = {
            let mut dir = lock_unpoisoned(&self.directory);
            let container = dir
                .container_of(caller)
                .ok_or(CorralError::NotAMember { thread: caller })?;
            let outcome = dir
                .get_mut(container)
                .ok_or(CorralError::NotFound {
                    kind: "container",
                    id: container.to_string(),
                })?
                .members
                .remove(caller)?;
            match outcome {
                RemovalOutcome::Emptied => {
                    let _ = dir.remove_if_empty(container);
                    tracing::debug!(thread = %caller, container = %container, "left; container drained");
                    None
                }
                RemovalOutcome::Elected { thread, waiter } => {
                    tracing::debug!(
                        thread = %caller,
                        container = %container,
                        elected = %thread,
                        "left; successor elected"
                    );
                    Some((thread, waiter))
                }
                RemovalOutcome::Detached => {
                    tracing::debug!(thread = %caller, container = %container, "left while suspended");
                    None
                }
            }
        };

        // Wake outside the lock, after the mutation committed.
        if let Some((_, waiter)) = woken {
            waiter.wake();
        }
        Ok(())
    }

    /// Performs one round-robin switch on the container currently targeted
    /// by the rotation cursor, then advances the cursor.
    ///
    /// A target with fewer than two members has nothing to rotate and is
    /// skipped, but the cursor still advances. Returns the id of the
    /// container the call targeted.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::NoContainers`] if the directory is empty.
    pub fn rotate(&self) -> Result<ContainerId> {
        let (target, woken): (ContainerId, Option<(ThreadId, Arc<Waiter>)>) = {
            let mut dir = lock_unpoisoned(&self.directory);
            let target = dir.cursor().ok_or(CorralError::NoContainers)?;
            let woken = dir
                .get_mut(target)
                .ok_or(CorralError::NotFound {
                    kind: "container",
                    id: target.to_string(),
                })?
                .members
                .rotate();
            dir.advance_cursor();
            match &woken {
                Some((elected, _)) => {
                    tracing::debug!(container = %target, elected = %elected, "rotated");
                }
                None => tracing::trace!(container = %target, "rotation skipped, nothing to rotate"),
            }
            (target, woken)
        };

        if let Some((_, waiter)) = woken {
            waiter.wake();
        }
        Ok(target)
    }

    /// Resolves a shared block in the caller's container, allocating a
    /// zero-initialised block of `len` bytes on first request for this
    /// object id. Repeated requests return the same block.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::NoContainer`] if the caller belongs to no
    /// container, or [`CorralError::Invalid`] for an unallocatable size.
    pub fn map_shared(&self, caller: ThreadId, object: ObjectId, len: u64) -> Result<BlockHandle> {
        let mut dir = lock_unpoisoned(&self.directory);
        let container = dir
            .container_of(caller)
            .ok_or(CorralError::NoContainer { thread: caller })?;
        let handle = dir
            .get_mut(container)
            .ok_or(CorralError::NotFound {
                kind: "container",
                id: container.to_string(),
            })?
            .arena
            .map(object, len)?;
        tracing::debug!(
            thread = %caller,
            container = %container,
            object = %object,
            len = handle.len(),
            "mapped shared block"
        );
        Ok(handle)
    }

    /// Run state of the given thread's membership record, if any.
    #[must_use]
    pub fn run_state(&self, thread: ThreadId) -> Option<RunState> {
        let dir = lock_unpoisoned(&self.directory);
        let container = dir.container_of(thread)?;
        dir.get(container)?.members.state_of(thread)
    }

    /// Id of the container holding the given thread, if any.
    #[must_use]
    pub fn container_of(&self, thread: ThreadId) -> Option<ContainerId> {
        lock_unpoisoned(&self.directory).container_of(thread)
    }

    /// Point-in-time view of the whole directory.
    #[must_use]
    pub fn snapshot(&self) -> DirectorySnapshot {
        lock_unpoisoned(&self.directory).snapshot()
    }

    /// Structural invariant check; empty result means sound.
    #[must_use]
    pub fn audit(&self) -> Vec<String> {
        lock_unpoisoned(&self.directory).audit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(n: u64) -> ContainerId {
        ContainerId::new(n)
    }

    fn tid(n: u64) -> ThreadId {
        ThreadId::new(n)
    }

    #[test]
    fn solo_join_is_immediately_runnable() {
        let sched = Scheduler::new();
        sched.join(tid(1), cid(1)).expect("fresh container");
        assert_eq!(sched.run_state(tid(1)), Some(RunState::Runnable));
    }

    #[test]
    fn double_join_is_rejected() {
        let sched = Scheduler::new();
        sched.join(tid(1), cid(1)).expect("fresh container");
        assert!(matches!(
            sched.join(tid(1), cid(2)),
            Err(CorralError::Invalid { .. })
        ));
        // The failed join must not have created container 2.
        assert_eq!(sched.snapshot().containers.len(), 1);
    }

    #[test]
    fn leave_without_membership_fails_cleanly() {
        let sched = Scheduler::new();
        assert!(matches!(
            sched.leave(tid(5)),
            Err(CorralError::NotAMember { .. })
        ));
        assert!(sched.audit().is_empty());
    }

    #[test]
    fn last_leave_unlinks_the_container() {
        let sched = Scheduler::new();
        sched.join(tid(1), cid(1)).expect("fresh container");
        sched.leave(tid(1)).expect("member");
        assert!(sched.snapshot().containers.is_empty());
        assert_eq!(sched.snapshot().cursor, None);
    }

    #[test]
    fn rotate_on_empty_directory_fails() {
        let sched = Scheduler::new();
        assert!(matches!(sched.rotate(), Err(CorralError::NoContainers)));
    }

    #[test]
    fn rotate_skips_single_member_container_but_advances_cursor() {
        let sched = Scheduler::new();
        sched.join(tid(1), cid(1)).expect("fresh container");
        sched.join(tid(2), cid(2)).expect("fresh container");

        let target = sched.rotate().expect("directory populated");
        assert_eq!(target, cid(1));
        assert_eq!(sched.run_state(tid(1)), Some(RunState::Runnable));
        assert_eq!(sched.snapshot().cursor, Some(cid(2)));

        let target = sched.rotate().expect("directory populated");
        assert_eq!(target, cid(2));
        assert_eq!(sched.snapshot().cursor, Some(cid(1)));
    }

    #[test]
    fn map_shared_without_membership_fails() {
        let sched = Scheduler::new();
        assert!(matches!(
            sched.map_shared(tid(1), ObjectId::new(7), 4096),
            Err(CorralError::NoContainer { .. })
        ));
    }

    #[test]
    fn map_shared_is_idempotent_within_a_container() {
        let sched = Scheduler::new();
        sched.join(tid(1), cid(9)).expect("fresh container");
        let a = sched
            .map_shared(tid(1), ObjectId::new(7), 4096)
            .expect("first mapping");
        let b = sched
            .map_shared(tid(1), ObjectId::new(7), 4096)
            .expect("repeat mapping");
        assert!(a.same_block(&b));
    }
}
