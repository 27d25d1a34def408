//! Global registry of live containers and the rotation cursor.
//!
//! Containers are held in creation order, which is also rotation order.
//! The cursor names the container the *next* `rotate` call will target; it
//! is a container id rather than an index, so compaction after a removal
//! can never leave it pointing at the wrong slot.

use serde::{Deserialize, Serialize};

use corral_common::types::{ContainerId, ObjectId, RunState, ThreadId};

use crate::container::Container;

/// The directory of live containers.
#[derive(Debug, Default)]
pub struct ContainerDirectory {
    containers: Vec<Container>,
    cursor: Option<ContainerId>,
}

impl ContainerDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Whether the directory holds no containers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Id of the container the next rotation will target.
    #[must_use]
    pub const fn cursor(&self) -> Option<ContainerId> {
        self.cursor
    }

    /// Shared access to a live container.
    #[must_use]
    pub fn get(&self, id: ContainerId) -> Option<&Container> {
        self.containers.iter().find(|c| c.id() == id)
    }

    /// Exclusive access to a live container.
    #[must_use]
    pub fn get_mut(&mut self, id: ContainerId) -> Option<&mut Container> {
        self.containers.iter_mut().find(|c| c.id() == id)
    }

    /// Locates a container by id, creating and appending an empty one if
    /// none exists. The first container ever created (or the first after
    /// the directory drained) becomes the rotation target. Never fails.
    pub fn find_or_create(&mut self, id: ContainerId) -> &mut Container {
        if let Some(index) = self.containers.iter().position(|c| c.id() == id) {
            return &mut self.containers[index];
        }
        tracing::debug!(container = %id, "creating container");
        self.containers.push(Container::new(id));
        if self.cursor.is_none() {
            self.cursor = Some(id);
        }
        // Just pushed, so the tail is the new container.
        let tail = self.containers.len() - 1;
        &mut self.containers[tail]
    }

    /// Unlinks the container if its member list is empty.
    ///
    /// When the unlinked container was the rotation target, the cursor
    /// advances to its successor, or clears if the directory drained.
    /// Returns whether a removal happened.
    pub fn remove_if_empty(&mut self, id: ContainerId) -> bool {
        let Some(index) = self.containers.iter().position(|c| c.id() == id) else {
            return false;
        };
        if !self.containers[index].members.is_empty() {
            return false;
        }
        if self.cursor == Some(id) {
            self.cursor = self.successor_of(id);
        }
        let removed = self.containers.remove(index);
        tracing::debug!(container = %removed.id(), "removed empty container");
        true
    }

    /// Next container after the given one in directory order, wrapping to
    /// the first. `None` when the directory holds zero or one container,
    /// making rotation across containers meaningless.
    #[must_use]
    pub fn successor_of(&self, id: ContainerId) -> Option<ContainerId> {
        if self.containers.len() < 2 {
            return None;
        }
        let index = self.containers.iter().position(|c| c.id() == id)?;
        let next = (index + 1) % self.containers.len();
        Some(self.containers[next].id())
    }

    /// Advances the rotation cursor to the successor container. With a
    /// single live container the cursor wraps onto itself.
    pub fn advance_cursor(&mut self) {
        if let Some(current) = self.cursor {
            if let Some(next) = self.successor_of(current) {
                self.cursor = Some(next);
            }
        }
    }

    /// Id of the container holding the given thread's membership record.
    #[must_use]
    pub fn container_of(&self, thread: ThreadId) -> Option<ContainerId> {
        self.containers
            .iter()
            .find(|c| c.members.contains(thread))
            .map(Container::id)
    }

    /// Captures a serialisable view of every live container.
    #[must_use]
    pub fn snapshot(&self) -> DirectorySnapshot {
        DirectorySnapshot {
            containers: self
                .containers
                .iter()
                .map(|c| ContainerSnapshot {
                    id: c.id(),
                    running: c.members.running(),
                    members: c
                        .members
                        .iter()
                        .map(|m| MemberSnapshot {
                            thread_id: m.thread_id(),
                            state: m.state(),
                        })
                        .collect(),
                    objects: c.arena.object_ids(),
                })
                .collect(),
            cursor: self.cursor,
        }
    }

    /// Checks the structural invariants of the directory.
    ///
    /// Returns one description per violation: an empty container left in
    /// the directory, a container without exactly one runnable member, or
    /// a cursor naming a dead container. Empty result means the directory
    /// is sound.
    #[must_use]
    pub fn audit(&self) -> Vec<String> {
        let mut violations = Vec::new();
        for container in &self.containers {
            if container.members.is_empty() {
                violations.push(format!("container {} is empty but live", container.id()));
                continue;
            }
            let runnable = container
                .members
                .iter()
                .filter(|m| m.state() == RunState::Runnable)
                .count();
            if runnable != 1 {
                violations.push(format!(
                    "container {} has {runnable} runnable members, want exactly 1",
                    container.id()
                ));
            }
            if let Some(running) = container.members.running() {
                if container.members.state_of(running) != Some(RunState::Runnable) {
                    violations.push(format!(
                        "container {} running slot names suspended thread {running}",
                        container.id()
                    ));
                }
            } else {
                violations.push(format!("container {} has no running slot", container.id()));
            }
        }
        match self.cursor {
            Some(id) if self.get(id).is_none() => {
                violations.push(format!("cursor targets dead container {id}"));
            }
            None if !self.containers.is_empty() => {
                violations.push("cursor unset while containers are live".to_owned());
            }
            _ => {}
        }
        violations
    }
}

/// Point-in-time view of one membership record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSnapshot {
    /// Identity of the member thread.
    pub thread_id: ThreadId,
    /// Run state at capture time.
    pub state: RunState,
}

/// Point-in-time view of one container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    /// Container id.
    pub id: ContainerId,
    /// Member currently holding the running slot.
    pub running: Option<ThreadId>,
    /// Members in join order.
    pub members: Vec<MemberSnapshot>,
    /// Object ids live in the container's arena.
    pub objects: Vec<ObjectId>,
}

/// Point-in-time view of the whole directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    /// Containers in creation (= rotation) order.
    pub containers: Vec<ContainerSnapshot>,
    /// Rotation target for the next `rotate` call.
    pub cursor: Option<ContainerId>,
}
