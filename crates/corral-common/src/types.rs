//! Domain primitive types used across the corral workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CorralError, Result};

/// Unique identifier for a resource container.
///
/// Ids are caller-chosen; creating two containers with the same id is
/// impossible — `join` with a live id attaches to the existing container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(u64);

impl ContainerId {
    /// Creates a container ID from a non-negative raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Validates a raw signed id as it arrives at the boundary.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Invalid`] if the raw value is negative.
    pub fn from_raw(raw: i64) -> Result<Self> {
        let id = u64::try_from(raw).map_err(|_| CorralError::Invalid {
            message: format!("negative container id: {raw}"),
        })?;
        Ok(Self(id))
    }

    /// Returns the inner numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an execution thread, as assigned by the host scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadId(u64);

impl ThreadId {
    /// Creates a thread ID from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the inner numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key for a shared memory block, unique within one container's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Creates an object ID from a non-negative raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Validates a raw signed id as it arrives at the boundary.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Invalid`] if the raw value is negative.
    pub fn from_raw(raw: i64) -> Result<Self> {
        let id = u64::try_from(raw).map_err(|_| CorralError::Invalid {
            message: format!("negative object id: {raw}"),
        })?;
        Ok(Self(id))
    }

    /// Returns the inner numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Run state of a container member.
///
/// Exactly one member per non-empty container is `Runnable`; every other
/// member is `Suspended` until a rotation or a departure elects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// The member holds its container's scheduling slot.
    Runnable,
    /// The member is parked, waiting to be elected.
    Suspended,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runnable => write!(f, "runnable"),
            Self::Suspended => write!(f, "suspended"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_id_rejects_negative_raw() {
        assert!(ContainerId::from_raw(-1).is_err());
        assert!(ContainerId::from_raw(0).is_ok());
        assert_eq!(ContainerId::from_raw(42).unwrap(), ContainerId::new(42));
    }

    #[test]
    fn object_id_rejects_negative_raw() {
        assert!(ObjectId::from_raw(i64::MIN).is_err());
        assert_eq!(ObjectId::from_raw(7).unwrap(), ObjectId::new(7));
    }

    #[test]
    fn run_state_display() {
        assert_eq!(RunState::Runnable.to_string(), "runnable");
        assert_eq!(RunState::Suspended.to_string(), "suspended");
    }
}
