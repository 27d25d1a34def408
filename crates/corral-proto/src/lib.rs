//! # corral-proto
//!
//! The boundary surface of the corral scheduler, modelled on the ioctl
//! convention of the reference device: a raw opcode plus a fixed-size
//! parameter block arrive from the caller, are validated and copied into
//! typed request shapes, dispatched into the core, and answered with
//! either a typed reply or a negative status code.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod device;
pub mod opcode;
pub mod request;
pub mod status;
