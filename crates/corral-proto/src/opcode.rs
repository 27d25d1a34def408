//! Request opcodes and their raw wire numbers.

/// Raw request numbers as they appear on the wire.
pub mod raw {
    /// Join (or create) a container.
    pub const CREATE: u64 = 0x4301;
    /// Remove the caller from its container.
    pub const DELETE: u64 = 0x4302;
    /// Round-robin switch on the cursor container.
    pub const CSWITCH: u64 = 0x4303;
    /// Lock the caller's container (reserved, no-op).
    pub const LOCK: u64 = 0x4304;
    /// Unlock the caller's container (reserved, no-op).
    pub const UNLOCK: u64 = 0x4305;
    /// Release a shared object (reserved, no-op).
    pub const FREE: u64 = 0x4306;
    /// Map a shared object into the caller's view.
    pub const MMAP: u64 = 0x4307;
}

/// Decoded request opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Join (or create) a container.
    Join,
    /// Remove the caller from its container.
    Leave,
    /// Round-robin switch on the cursor container.
    Rotate,
    /// Lock the caller's container (reserved, no-op).
    Lock,
    /// Unlock the caller's container (reserved, no-op).
    Unlock,
    /// Release a shared object (reserved, no-op).
    Free,
    /// Map a shared object into the caller's view.
    Mmap,
}

impl Opcode {
    /// Decodes a raw request number. `None` for numbers this device does
    /// not implement.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Option<Self> {
        match raw {
            raw::CREATE => Some(Self::Join),
            raw::DELETE => Some(Self::Leave),
            raw::CSWITCH => Some(Self::Rotate),
            raw::LOCK => Some(Self::Lock),
            raw::UNLOCK => Some(Self::Unlock),
            raw::FREE => Some(Self::Free),
            raw::MMAP => Some(Self::Mmap),
            _ => None,
        }
    }

    /// Raw wire number of this opcode.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        match self {
            Self::Join => raw::CREATE,
            Self::Leave => raw::DELETE,
            Self::Rotate => raw::CSWITCH,
            Self::Lock => raw::LOCK,
            Self::Unlock => raw::UNLOCK,
            Self::Free => raw::FREE,
            Self::Mmap => raw::MMAP,
        }
    }
}
