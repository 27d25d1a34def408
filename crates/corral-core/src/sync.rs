//! Lock helpers shared by the stateful modules.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Acquires a mutex, recovering the guard if a previous holder panicked.
///
/// Directory state stays structurally valid across a poisoned lock: every
/// mutation commits fully before the guard drops, so continuing with the
/// inner value is sound.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
