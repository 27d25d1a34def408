//! Unified error types for the corral workspace.
//!
//! Every failure in the core is local, synchronous, and recoverable: the
//! caller receives a distinct variant and the directory state is left
//! unchanged. Nothing here is fatal to the process; the boundary adapter
//! decides how to surface a failure to its caller.

use thiserror::Error;

use crate::types::ThreadId;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CorralError {
    /// A request parameter block could not be copied across the boundary.
    #[error("parameter transfer fault: {message}")]
    TransferFault {
        /// Description of the failed transfer.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// The calling thread is not a member of any container.
    #[error("thread {thread} is not a member of any container")]
    NotAMember {
        /// Identity of the thread that issued the request.
        thread: ThreadId,
    },

    /// A rotation was requested while the directory holds no containers.
    #[error("rotation requested on an empty directory")]
    NoContainers,

    /// A memory operation was issued by a thread with no membership.
    #[error("thread {thread} belongs to no container")]
    NoContainer {
        /// Identity of the thread that issued the request.
        thread: ThreadId,
    },

    /// A request carried a malformed parameter.
    #[error("invalid request: {message}")]
    Invalid {
        /// Description of the invalid parameter.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CorralError>;
