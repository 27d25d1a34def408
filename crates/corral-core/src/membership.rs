//! Per-container ordered membership with a single running slot.
//!
//! Join order is significant: it defines round-robin succession. The
//! running member is tracked by thread id rather than by position, so
//! removals never alias the running slot through a stale index.

use std::sync::Arc;

use corral_common::error::{CorralError, Result};
use corral_common::types::{ContainerId, RunState, ThreadId};

use crate::member::{Member, Waiter};

/// Outcome of appending a member to a container.
#[derive(Debug)]
pub enum Appended {
    /// The new member is the container's first and is immediately runnable.
    FirstRunnable,
    /// The new member was appended suspended; the calling thread must park
    /// on this token until elected.
    Parked(Arc<Waiter>),
}

/// Outcome of removing a member from a container.
#[derive(Debug)]
pub enum RemovalOutcome {
    /// The removed member was the last one; the container is now empty and
    /// must be unlinked from the directory.
    Emptied,
    /// The removed member held the running slot; its successor was elected
    /// and its waiter must be woken after the mutation commits.
    Elected {
        /// Identity of the newly running member.
        thread: ThreadId,
        /// Parking token to wake.
        waiter: Arc<Waiter>,
    },
    /// A suspended member was removed; runnability is unchanged.
    Detached,
}

/// Ordered sequence of membership records for one container.
#[derive(Debug, Default)]
pub struct MembershipList {
    members: Vec<Member>,
    running: Option<ThreadId>,
}

impl MembershipList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the list holds no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Identity of the member currently holding the running slot.
    #[must_use]
    pub const fn running(&self) -> Option<ThreadId> {
        self.running
    }

    /// Whether the given thread is a member.
    #[must_use]
    pub fn contains(&self, thread: ThreadId) -> bool {
        self.position_of(thread).is_some()
    }

    /// Run state of the given member, if present.
    #[must_use]
    pub fn state_of(&self, thread: ThreadId) -> Option<RunState> {
        self.position_of(thread).map(|i| self.members[i].state())
    }

    /// Iterates over the membership records in join order.
    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    /// Inserts a member at the tail.
    ///
    /// The first member of a container becomes runnable immediately; every
    /// later member is appended suspended and its caller must park on the
    /// returned token.
    pub fn append(&mut self, thread: ThreadId, container: ContainerId) -> Appended {
        if self.members.is_empty() {
            let member = Member::new(thread, container, RunState::Runnable);
            self.members.push(member);
            self.running = Some(thread);
            return Appended::FirstRunnable;
        }
        let member = Member::new(thread, container, RunState::Suspended);
        let waiter = member.waiter();
        self.members.push(member);
        Appended::Parked(waiter)
    }

    /// Splices a member out of the list.
    ///
    /// Removing the running member elects its successor in join order
    /// (wrapping) and reports the waiter to wake. Removing the last member
    /// empties the list; the caller must then unlink the container.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::NotFound`] if no member matches.
    pub fn remove(&mut self, thread: ThreadId) -> Result<RemovalOutcome> {
        let index = self.position_of(thread).ok_or(CorralError::NotFound {
            kind: "member",
            id: thread.to_string(),
        })?;
        let was_running = self.running == Some(thread);
        let removed = self.members.remove(index);
        drop(removed);

        if self.members.is_empty() {
            self.running = None;
            return Ok(RemovalOutcome::Emptied);
        }
        if !was_running {
            return Ok(RemovalOutcome::Detached);
        }

        // The departed member's successor by join order now occupies the
        // removed slot's index, wrapping past the tail.
        let successor_index = index % self.members.len();
        let successor = &mut self.members[successor_index];
        successor.set_state(RunState::Runnable);
        self.running = Some(successor.thread_id());
        Ok(RemovalOutcome::Elected {
            thread: successor.thread_id(),
            waiter: successor.waiter(),
        })
    }

    /// Next member after the given one in join order, wrapping to the head.
    /// `None` if the member is absent or alone.
    #[must_use]
    pub fn successor_of(&self, thread: ThreadId) -> Option<ThreadId> {
        if self.members.len() < 2 {
            return None;
        }
        let index = self.position_of(thread)?;
        let next = (index + 1) % self.members.len();
        Some(self.members[next].thread_id())
    }

    /// Advances the running slot to the successor of the current running
    /// member, suspending the incumbent.
    ///
    /// Returns the elected member and its waiter, or `None` when the list
    /// has fewer than two members and there is nothing to rotate.
    pub fn rotate(&mut self) -> Option<(ThreadId, Arc<Waiter>)> {
        let incumbent = self.running?;
        let elected = self.successor_of(incumbent)?;

        let incumbent_index = self.position_of(incumbent)?;
        self.members[incumbent_index].set_state(RunState::Suspended);

        let elected_index = self.position_of(elected)?;
        let member = &mut self.members[elected_index];
        member.set_state(RunState::Runnable);
        self.running = Some(elected);
        Some((elected, member.waiter()))
    }

    fn position_of(&self, thread: ThreadId) -> Option<usize> {
        self.members.iter().position(|m| m.thread_id() == thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CID: ContainerId = ContainerId::new(1);

    fn tid(n: u64) -> ThreadId {
        ThreadId::new(n)
    }

    #[test]
    fn first_member_is_runnable_without_parking() {
        let mut list = MembershipList::new();
        assert!(matches!(list.append(tid(1), CID), Appended::FirstRunnable));
        assert_eq!(list.running(), Some(tid(1)));
        assert_eq!(list.state_of(tid(1)), Some(RunState::Runnable));
    }

    #[test]
    fn later_members_are_appended_suspended() {
        let mut list = MembershipList::new();
        let _ = list.append(tid(1), CID);
        assert!(matches!(list.append(tid(2), CID), Appended::Parked(_)));
        assert_eq!(list.running(), Some(tid(1)));
        assert_eq!(list.state_of(tid(2)), Some(RunState::Suspended));
    }

    #[test]
    fn successor_wraps_in_join_order() {
        let mut list = MembershipList::new();
        let _ = list.append(tid(1), CID);
        let _ = list.append(tid(2), CID);
        let _ = list.append(tid(3), CID);
        assert_eq!(list.successor_of(tid(1)), Some(tid(2)));
        assert_eq!(list.successor_of(tid(3)), Some(tid(1)));
    }

    #[test]
    fn successor_of_sole_member_is_none() {
        let mut list = MembershipList::new();
        let _ = list.append(tid(1), CID);
        assert_eq!(list.successor_of(tid(1)), None);
    }

    #[test]
    fn remove_unknown_member_fails() {
        let mut list = MembershipList::new();
        let _ = list.append(tid(1), CID);
        assert!(list.remove(tid(9)).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn removing_running_member_elects_successor() {
        let mut list = MembershipList::new();
        let _ = list.append(tid(1), CID);
        let _ = list.append(tid(2), CID);
        let _ = list.append(tid(3), CID);

        let outcome = list.remove(tid(1)).expect("member exists");
        match outcome {
            RemovalOutcome::Elected { thread, .. } => assert_eq!(thread, tid(2)),
            other => panic!("expected election, got {other:?}"),
        }
        assert_eq!(list.running(), Some(tid(2)));
        assert_eq!(list.state_of(tid(2)), Some(RunState::Runnable));
        assert_eq!(list.state_of(tid(3)), Some(RunState::Suspended));
    }

    #[test]
    fn removing_running_tail_wraps_to_head() {
        let mut list = MembershipList::new();
        let _ = list.append(tid(1), CID);
        let _ = list.append(tid(2), CID);
        let _ = list.rotate(); // running: 2
        assert_eq!(list.running(), Some(tid(2)));

        let outcome = list.remove(tid(2)).expect("member exists");
        match outcome {
            RemovalOutcome::Elected { thread, .. } => assert_eq!(thread, tid(1)),
            other => panic!("expected election, got {other:?}"),
        }
    }

    #[test]
    fn removing_suspended_member_keeps_running_slot() {
        let mut list = MembershipList::new();
        let _ = list.append(tid(1), CID);
        let _ = list.append(tid(2), CID);
        let _ = list.append(tid(3), CID);

        let outcome = list.remove(tid(3)).expect("member exists");
        assert!(matches!(outcome, RemovalOutcome::Detached));
        assert_eq!(list.running(), Some(tid(1)));
    }

    #[test]
    fn removing_last_member_empties_the_list() {
        let mut list = MembershipList::new();
        let _ = list.append(tid(1), CID);
        let outcome = list.remove(tid(1)).expect("member exists");
        assert!(matches!(outcome, RemovalOutcome::Emptied));
        assert!(list.is_empty());
        assert_eq!(list.running(), None);
    }

    #[test]
    fn rotate_cycles_through_join_order() {
        let mut list = MembershipList::new();
        let _ = list.append(tid(1), CID);
        let _ = list.append(tid(2), CID);
        let _ = list.append(tid(3), CID);

        let (elected, _) = list.rotate().expect("two or more members");
        assert_eq!(elected, tid(2));
        let (elected, _) = list.rotate().expect("two or more members");
        assert_eq!(elected, tid(3));
        let (elected, _) = list.rotate().expect("two or more members");
        assert_eq!(elected, tid(1));
        assert_eq!(list.state_of(tid(2)), Some(RunState::Suspended));
        assert_eq!(list.state_of(tid(1)), Some(RunState::Runnable));
    }

    #[test]
    fn rotate_with_fewer_than_two_members_is_noop() {
        let mut list = MembershipList::new();
        assert!(list.rotate().is_none());
        let _ = list.append(tid(1), CID);
        assert!(list.rotate().is_none());
        assert_eq!(list.running(), Some(tid(1)));
    }
}
