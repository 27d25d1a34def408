//! A single resource container: id, ordered membership, and memory arena.

use corral_common::types::ContainerId;

use crate::arena::MemoryArena;
use crate::membership::MembershipList;

/// A live container.
///
/// Exists in the directory iff its member list is non-empty; a container
/// whose last member leaves is unlinked synchronously, never left dangling.
#[derive(Debug)]
pub struct Container {
    id: ContainerId,
    /// Ordered membership; join order defines round-robin succession.
    pub members: MembershipList,
    /// This container's shared-memory arena.
    pub arena: MemoryArena,
}

impl Container {
    /// Creates an empty container with the given id.
    #[must_use]
    pub fn new(id: ContainerId) -> Self {
        Self {
            id,
            members: MembershipList::new(),
            arena: MemoryArena::new(),
        }
    }

    /// This container's id.
    #[must_use]
    pub const fn id(&self) -> ContainerId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_container_is_empty() {
        let c = Container::new(ContainerId::new(9));
        assert_eq!(c.id(), ContainerId::new(9));
        assert!(c.members.is_empty());
        assert!(c.arena.is_empty());
    }
}
