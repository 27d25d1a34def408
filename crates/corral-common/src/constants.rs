//! System-wide constants.

/// Size in bytes of the fixed request parameter block (three 64-bit fields).
pub const PARAM_BLOCK_LEN: usize = 24;

/// Largest shared-memory block a single `mmap` request may allocate.
pub const MAX_BLOCK_BYTES: u64 = 64 * 1024 * 1024;

/// Application name used in CLI output.
pub const APP_NAME: &str = "corral";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "corral";
