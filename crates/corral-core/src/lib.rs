//! # corral-core
//!
//! Resource containers: named groups that independent OS threads join
//! voluntarily. Each container enforces at most one runnable member at a
//! time through cooperative round-robin scheduling, and carries a keyed
//! shared-memory arena that all of its members resolve identically.
//!
//! The crate is organised leaves-first:
//! - **Arena**: per-container map from object id to a zero-initialised block.
//! - **Membership**: per-container ordered member list with one running slot.
//! - **Directory**: the global registry of containers plus the rotation cursor.
//! - **Scheduler**: `join` / `leave` / `rotate` / `map_shared` on top of the
//!   directory, owning the park/wake contract for member threads.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod arena;
pub mod container;
pub mod directory;
pub mod member;
pub mod membership;
pub mod scheduler;
pub mod thread_id;

pub(crate) mod sync;
