//! Error types for construction and the non-blocking operations.

use std::fmt;

use thiserror::Error;

/// Errors surfaced while constructing a queue.
///
/// Construction is the only fallible phase; once a queue exists, its
/// operations fail only with "full", "empty" or "contended", all of which are
/// ordinary return values rather than errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Capacity must be strictly positive.
    #[error("capacity must be greater than zero")]
    ZeroCapacity,
    /// `capacity * size_of::<T>()` exceeds the maximum allocation size.
    #[error("capacity overflows the maximum allocation size")]
    CapacityOverflow,
    /// The global allocator refused the aligned storage request.
    #[error("aligned storage allocation failed")]
    AllocationFailed,
}

/// Error returned by `try_push` when the queue is full or the cursor race was
/// lost; carries the rejected value back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushError<T>(pub T);

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue is full")
    }
}

impl<T: fmt::Debug> std::error::Error for PushError<T> {}
