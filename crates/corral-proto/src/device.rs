//! Request dispatch into the scheduler.
//!
//! `Device` is the control surface the transport hands decoded requests
//! to. `submit` is the typed path; `ioctl` is the raw path taking the
//! wire opcode and parameter-block bytes and answering with a status
//! code, like the reference device's control function.

use corral_core::arena::BlockHandle;
use corral_core::scheduler::Scheduler;

use corral_common::error::Result;
use corral_common::types::ThreadId;

use crate::opcode::Opcode;
use crate::request::Request;
use crate::status;

/// Successful reply to a request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// The operation completed with no value to return.
    Done,
    /// A shared block was resolved for the caller.
    Mapped(BlockHandle),
}

/// The boundary device wrapping one scheduling domain.
#[derive(Debug, Clone, Default)]
pub struct Device {
    scheduler: Scheduler,
}

impl Device {
    /// Creates a device over a fresh scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a device over an existing scheduler.
    #[must_use]
    pub const fn with_scheduler(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    /// The scheduling domain behind this device.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Dispatches a typed request on behalf of `caller`.
    ///
    /// `Lock`, `Unlock`, and `Free` are reserved: their parameters were
    /// validated during decode, and they succeed without touching any
    /// state. Their semantics are a future extension point.
    ///
    /// # Errors
    ///
    /// Propagates the core error of the dispatched operation; reserved
    /// operations never fail.
    pub fn submit(&self, caller: ThreadId, request: Request) -> Result<Reply> {
        match request {
            Request::Join { container } => {
                self.scheduler.join(caller, container)?;
                Ok(Reply::Done)
            }
            Request::Leave => {
                self.scheduler.leave(caller)?;
                Ok(Reply::Done)
            }
            Request::Rotate => {
                let _ = self.scheduler.rotate()?;
                Ok(Reply::Done)
            }
            Request::Lock { container }
            | Request::Unlock { container }
            | Request::Free { container } => {
                tracing::debug!(thread = %caller, container = %container, ?request, "reserved op accepted");
                Ok(Reply::Done)
            }
            Request::Mmap { object, length } => {
                let handle = self.scheduler.map_shared(caller, object, length)?;
                Ok(Reply::Mapped(handle))
            }
        }
    }

    /// Raw entry point: wire opcode plus parameter-block bytes in, status
    /// code out. Unknown opcodes answer [`status::UNSUPPORTED`].
    #[must_use]
    pub fn ioctl(&self, caller: ThreadId, raw_opcode: u64, payload: &[u8]) -> i32 {
        let Some(opcode) = Opcode::from_raw(raw_opcode) else {
            tracing::warn!(raw_opcode, "unsupported opcode");
            return status::UNSUPPORTED;
        };
        let request = match Request::decode(opcode, payload) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(?opcode, %err, "request rejected at the boundary");
                return status::from_error(&err);
            }
        };
        match self.submit(caller, request) {
            Ok(_) => status::OK,
            Err(err) => {
                tracing::debug!(?opcode, %err, "request failed");
                status::from_error(&err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use corral_common::types::{ContainerId, ObjectId};

    use crate::opcode::raw;
    use crate::request::ParamBlock;

    use super::*;

    fn block(container_id: i64, object_id: i64, length: i64) -> [u8; 24] {
        ParamBlock {
            container_id,
            object_id,
            length,
        }
        .encode()
    }

    #[test]
    fn join_via_ioctl_creates_the_container() {
        let device = Device::new();
        let status = device.ioctl(ThreadId::new(1), raw::CREATE, &block(5, 0, 0));
        assert_eq!(status, status::OK);
        let snap = device.scheduler().snapshot();
        assert_eq!(snap.containers.len(), 1);
        assert_eq!(snap.containers[0].id, ContainerId::new(5));
    }

    #[test]
    fn unknown_opcode_is_unsupported() {
        let device = Device::new();
        assert_eq!(
            device.ioctl(ThreadId::new(1), 0xdead, &block(0, 0, 0)),
            status::UNSUPPORTED
        );
    }

    #[test]
    fn short_payload_is_a_transfer_fault() {
        let device = Device::new();
        assert_eq!(
            device.ioctl(ThreadId::new(1), raw::CREATE, &[0u8; 8]),
            status::TRANSFER_FAULT
        );
        assert!(device.scheduler().snapshot().containers.is_empty());
    }

    #[test]
    fn leave_without_membership_maps_to_esrch() {
        let device = Device::new();
        assert_eq!(
            device.ioctl(ThreadId::new(1), raw::DELETE, &block(0, 0, 0)),
            status::NOT_A_MEMBER
        );
    }

    #[test]
    fn rotate_on_empty_directory_maps_to_enodev() {
        let device = Device::new();
        assert_eq!(
            device.ioctl(ThreadId::new(1), raw::CSWITCH, &block(0, 0, 0)),
            status::NO_CONTAINERS
        );
    }

    #[test]
    fn reserved_ops_accept_and_mutate_nothing() {
        let device = Device::new();
        let _ = device.ioctl(ThreadId::new(1), raw::CREATE, &block(5, 0, 0));
        let before = device.scheduler().snapshot();

        for op in [raw::LOCK, raw::UNLOCK, raw::FREE] {
            assert_eq!(device.ioctl(ThreadId::new(1), op, &block(5, 0, 0)), status::OK);
        }

        let after = device.scheduler().snapshot();
        assert_eq!(before.containers.len(), after.containers.len());
        assert_eq!(before.cursor, after.cursor);
        assert_eq!(after.containers[0].members.len(), 1);
        assert!(after.containers[0].objects.is_empty());
    }

    #[test]
    fn reserved_ops_still_validate_their_block() {
        let device = Device::new();
        assert_eq!(
            device.ioctl(ThreadId::new(1), raw::LOCK, &block(-5, 0, 0)),
            status::INVALID
        );
        assert_eq!(
            device.ioctl(ThreadId::new(1), raw::FREE, &[0u8; 3]),
            status::TRANSFER_FAULT
        );
    }

    #[test]
    fn mmap_without_membership_maps_to_enxio() {
        let device = Device::new();
        assert_eq!(
            device.ioctl(ThreadId::new(1), raw::MMAP, &block(0, 7, 4096)),
            status::NO_CONTAINER
        );
    }

    #[test]
    fn mmap_submit_returns_the_shared_handle() {
        let device = Device::new();
        let caller = ThreadId::new(1);
        let _ = device.ioctl(caller, raw::CREATE, &block(9, 0, 0));

        let request = Request::Mmap {
            object: ObjectId::new(7),
            length: 4096,
        };
        let Reply::Mapped(first) = device.submit(caller, request).expect("mapping") else {
            panic!("expected a mapped reply");
        };
        let Reply::Mapped(second) = device.submit(caller, request).expect("mapping") else {
            panic!("expected a mapped reply");
        };
        assert!(first.same_block(&second));
        assert_eq!(first.len(), 4096);
    }
}
