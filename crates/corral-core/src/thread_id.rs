//! Caller-identity plumbing.
//!
//! The scheduler keys every membership record by the identity the host
//! scheduler assigns to the calling thread. On Linux that is the kernel
//! tid; elsewhere a process-local counter keeps the crate testable.

use corral_common::types::ThreadId;

/// Identity of the calling OS thread.
#[cfg(target_os = "linux")]
#[must_use]
pub fn current_thread_id() -> ThreadId {
    let tid = nix::unistd::gettid().as_raw();
    ThreadId::new(u64::from(tid.unsigned_abs()))
}

/// Identity of the calling thread, from a process-local counter.
#[cfg(not(target_os = "linux"))]
#[must_use]
pub fn current_thread_id() -> ThreadId {
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static TID: u64 = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    TID.with(|tid| ThreadId::new(*tid))
}
