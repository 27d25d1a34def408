//! The fixed-size parameter block and its typed request shapes.
//!
//! Every operation carries the same block across the boundary: three
//! little-endian signed 64-bit fields. Each opcode reads the fields it
//! needs and ignores the rest, mirroring the reference command struct.

use corral_common::constants::PARAM_BLOCK_LEN;
use corral_common::error::{CorralError, Result};
use corral_common::types::{ContainerId, ObjectId};

use crate::opcode::Opcode;

/// Raw parameter block as copied across the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamBlock {
    /// Target container id (signed on the wire; negative is invalid).
    pub container_id: i64,
    /// Target object id (signed on the wire; negative is invalid).
    pub object_id: i64,
    /// Mapping length in bytes (signed on the wire; negative is invalid).
    pub length: i64,
}

impl ParamBlock {
    /// Decodes a block from its wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::TransferFault`] unless the input is exactly
    /// [`PARAM_BLOCK_LEN`] bytes — a short or long copy means the
    /// transfer itself failed, and no operation may be attempted.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let block: &[u8; PARAM_BLOCK_LEN] =
            bytes.try_into().map_err(|_| CorralError::TransferFault {
                message: format!("expected {PARAM_BLOCK_LEN} bytes, got {}", bytes.len()),
            })?;
        let field = |i: usize| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&block[i * 8..(i + 1) * 8]);
            i64::from_le_bytes(buf)
        };
        Ok(Self {
            container_id: field(0),
            object_id: field(1),
            length: field(2),
        })
    }

    /// Encodes the block into its wire bytes.
    #[must_use]
    pub fn encode(&self) -> [u8; PARAM_BLOCK_LEN] {
        let mut out = [0u8; PARAM_BLOCK_LEN];
        out[0..8].copy_from_slice(&self.container_id.to_le_bytes());
        out[8..16].copy_from_slice(&self.object_id.to_le_bytes());
        out[16..24].copy_from_slice(&self.length.to_le_bytes());
        out
    }
}

/// A validated request, one shape per opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Join (or create) the given container.
    Join {
        /// Target container id.
        container: ContainerId,
    },
    /// Remove the caller from its container.
    Leave,
    /// Round-robin switch on the cursor container.
    Rotate,
    /// Lock the given container (reserved, no-op).
    Lock {
        /// Target container id.
        container: ContainerId,
    },
    /// Unlock the given container (reserved, no-op).
    Unlock {
        /// Target container id.
        container: ContainerId,
    },
    /// Release a shared object (reserved, no-op).
    Free {
        /// Target container id.
        container: ContainerId,
    },
    /// Map a shared object into the caller's view.
    Mmap {
        /// Object id within the caller's container arena.
        object: ObjectId,
        /// Requested mapping length in bytes.
        length: u64,
    },
}

impl Request {
    /// Validates the raw bytes of a parameter block against an opcode.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::TransferFault`] for a malformed block and
    /// [`CorralError::Invalid`] for a negative id or length.
    pub fn decode(opcode: Opcode, bytes: &[u8]) -> Result<Self> {
        let block = ParamBlock::decode(bytes)?;
        Self::from_block(opcode, block)
    }

    /// Validates an already-copied parameter block against an opcode.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Invalid`] for a negative id or length.
    pub fn from_block(opcode: Opcode, block: ParamBlock) -> Result<Self> {
        match opcode {
            Opcode::Join => Ok(Self::Join {
                container: ContainerId::from_raw(block.container_id)?,
            }),
            Opcode::Leave => Ok(Self::Leave),
            Opcode::Rotate => Ok(Self::Rotate),
            Opcode::Lock => Ok(Self::Lock {
                container: ContainerId::from_raw(block.container_id)?,
            }),
            Opcode::Unlock => Ok(Self::Unlock {
                container: ContainerId::from_raw(block.container_id)?,
            }),
            Opcode::Free => Ok(Self::Free {
                container: ContainerId::from_raw(block.container_id)?,
            }),
            Opcode::Mmap => {
                let object = ObjectId::from_raw(block.object_id)?;
                let length = u64::try_from(block.length).map_err(|_| CorralError::Invalid {
                    message: format!("negative mapping length: {}", block.length),
                })?;
                Ok(Self::Mmap { object, length })
            }
        }
    }
}
