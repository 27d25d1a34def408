//! Per-container shared-memory arena.
//!
//! Maps an object id to a zero-initialised block allocated once per
//! `(container, object)` pair. Every member thread that requests the same
//! object id receives a handle to the same physical block.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use corral_common::constants::MAX_BLOCK_BYTES;
use corral_common::error::{CorralError, Result};
use corral_common::types::ObjectId;

use crate::sync::lock_unpoisoned;

/// A zero-initialised block shared by all members of one container.
#[derive(Debug)]
pub struct SharedBlock {
    object_id: ObjectId,
    data: Mutex<Box<[u8]>>,
}

impl SharedBlock {
    fn new(object_id: ObjectId, len: usize) -> Self {
        Self {
            object_id,
            data: Mutex::new(vec![0u8; len].into_boxed_slice()),
        }
    }

    /// Object id this block was allocated under.
    #[must_use]
    pub const fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Size of the block in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.data).len()
    }

    /// Whether the block holds zero bytes. Never true for arena blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to a shared block, suitable for mapping into the caller's view.
///
/// Cloning a handle never copies the block; all clones address the same
/// physical storage.
#[derive(Debug, Clone)]
pub struct BlockHandle {
    block: Arc<SharedBlock>,
}

impl BlockHandle {
    /// Object id of the underlying block.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.block.object_id()
    }

    /// Size of the underlying block in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.block.len()
    }

    /// Whether the underlying block holds zero bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

    /// Whether two handles address the same physical block.
    #[must_use]
    pub fn same_block(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.block, &other.block)
    }

    /// Copies `bytes` into the block starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Invalid`] if the write would run past the
    /// end of the block.
    pub fn write_at(&self, offset: usize, bytes: &[u8]) -> Result<()> {
        let mut data = lock_unpoisoned(&self.block.data);
        let end = offset.checked_add(bytes.len()).filter(|&e| e <= data.len());
        let Some(end) = end else {
            return Err(CorralError::Invalid {
                message: format!(
                    "write of {} bytes at offset {offset} exceeds block of {} bytes",
                    bytes.len(),
                    data.len()
                ),
            });
        };
        data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Reads `len` bytes from the block starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Invalid`] if the read would run past the
    /// end of the block.
    pub fn read_at(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        let data = lock_unpoisoned(&self.block.data);
        let end = offset.checked_add(len).filter(|&e| e <= data.len());
        let Some(end) = end else {
            return Err(CorralError::Invalid {
                message: format!(
                    "read of {len} bytes at offset {offset} exceeds block of {} bytes",
                    data.len()
                ),
            });
        };
        Ok(data[offset..end].to_vec())
    }
}

/// Keyed allocator for one container's shared blocks.
#[derive(Debug, Default)]
pub struct MemoryArena {
    blocks: HashMap<ObjectId, Arc<SharedBlock>>,
}

impl MemoryArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `object_id` to its block, allocating a zero-initialised
    /// block of `len` bytes on first request.
    ///
    /// Repeated requests for the same id return the existing block
    /// unchanged, regardless of the requested size; a mismatch is logged
    /// and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Invalid`] for a zero-length or oversized
    /// first allocation.
    pub fn map(&mut self, object_id: ObjectId, len: u64) -> Result<BlockHandle> {
        if let Some(existing) = self.blocks.get(&object_id) {
            if existing.len() as u64 != len {
                tracing::warn!(
                    object = %object_id,
                    existing = existing.len(),
                    requested = len,
                    "size mismatch on repeated mapping; returning existing block"
                );
            }
            return Ok(BlockHandle {
                block: Arc::clone(existing),
            });
        }

        if len == 0 || len > MAX_BLOCK_BYTES {
            return Err(CorralError::Invalid {
                message: format!("block size {len} outside (0, {MAX_BLOCK_BYTES}]"),
            });
        }
        #[allow(clippy::cast_possible_truncation)]
        let block = Arc::new(SharedBlock::new(object_id, len as usize));
        tracing::debug!(object = %object_id, len, "allocated shared block");
        let _ = self.blocks.insert(object_id, Arc::clone(&block));
        Ok(BlockHandle { block })
    }

    /// Number of live blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the arena holds no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Object ids of all live blocks, in ascending order.
    #[must_use]
    pub fn object_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.blocks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_mapping_allocates_zeroed_block() {
        let mut arena = MemoryArena::new();
        let handle = arena.map(ObjectId::new(7), 4096).expect("valid size");
        assert_eq!(handle.len(), 4096);
        assert_eq!(handle.read_at(0, 4096).expect("in range"), vec![0u8; 4096]);
    }

    #[test]
    fn repeated_mapping_returns_same_block() {
        let mut arena = MemoryArena::new();
        let a = arena.map(ObjectId::new(7), 4096).expect("valid size");
        a.write_at(16, b"shared").expect("in range");

        let b = arena.map(ObjectId::new(7), 4096).expect("valid size");
        assert!(a.same_block(&b));
        assert_eq!(b.read_at(16, 6).expect("in range"), b"shared");
    }

    #[test]
    fn size_mismatch_on_repeat_returns_existing_block() {
        let mut arena = MemoryArena::new();
        let a = arena.map(ObjectId::new(1), 64).expect("valid size");
        let b = arena.map(ObjectId::new(1), 4096).expect("repeat request");
        assert!(a.same_block(&b));
        assert_eq!(b.len(), 64);
    }

    #[test]
    fn distinct_object_ids_get_distinct_blocks() {
        let mut arena = MemoryArena::new();
        let a = arena.map(ObjectId::new(1), 64).expect("valid size");
        let b = arena.map(ObjectId::new(2), 64).expect("valid size");
        assert!(!a.same_block(&b));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn zero_and_oversized_allocations_are_rejected() {
        let mut arena = MemoryArena::new();
        assert!(arena.map(ObjectId::new(1), 0).is_err());
        assert!(arena.map(ObjectId::new(2), MAX_BLOCK_BYTES + 1).is_err());
        assert!(arena.is_empty());
    }

    #[test]
    fn out_of_range_access_is_rejected() {
        let mut arena = MemoryArena::new();
        let handle = arena.map(ObjectId::new(3), 16).expect("valid size");
        assert!(handle.write_at(12, b"too long").is_err());
        assert!(handle.read_at(usize::MAX, 2).is_err());
        // Failed write must not have touched the block.
        assert_eq!(handle.read_at(12, 4).expect("in range"), vec![0u8; 4]);
    }
}
