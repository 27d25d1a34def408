//! Negative status-code convention of the boundary.
//!
//! The reference device answers every request with `0` on success or a
//! negative errno. The mapping below keeps that convention so existing
//! callers can switch on the same codes.

use corral_common::error::CorralError;

/// Operation completed.
pub const OK: i32 = 0;
/// Parameter block could not be copied (EFAULT).
pub const TRANSFER_FAULT: i32 = -14;
/// Thread or container absent where required (ESRCH).
pub const NOT_A_MEMBER: i32 = -3;
/// Named resource does not exist (ENOENT).
pub const NOT_FOUND: i32 = -2;
/// Rotation requested on an empty directory (ENODEV).
pub const NO_CONTAINERS: i32 = -19;
/// Memory operation from a thread with no membership (ENXIO).
pub const NO_CONTAINER: i32 = -6;
/// Malformed id or length (EINVAL).
pub const INVALID: i32 = -22;
/// Opcode not implemented by this device (ENOTTY).
pub const UNSUPPORTED: i32 = -25;

/// Maps a core error to its wire status code.
#[must_use]
pub const fn from_error(err: &CorralError) -> i32 {
    match err {
        CorralError::TransferFault { .. } => TRANSFER_FAULT,
        CorralError::NotFound { .. } => NOT_FOUND,
        CorralError::NotAMember { .. } => NOT_A_MEMBER,
        CorralError::NoContainers => NO_CONTAINERS,
        CorralError::NoContainer { .. } => NO_CONTAINER,
        CorralError::Invalid { .. } | CorralError::Serialization { .. } => INVALID,
    }
}
