//! The uniform operation contract shared by the three queue flavors.

use crossbeam_utils::Backoff;

use crate::error::PushError;

/// Producing half of a ring queue.
///
/// The `try_` operations never suspend and never allocate: failure means the
/// queue is full or another producer won the cursor race, and the caller
/// decides whether to retry. The blocking variants encode the obvious retry
/// policy: spin briefly, then yield the thread, forever. They never park.
pub trait QueueProducer<T> {
    /// Attempts to enqueue one value without blocking.
    ///
    /// On failure the value travels back to the caller inside the error.
    fn try_push(&mut self, value: T) -> Result<(), PushError<T>>;

    /// Attempts to enqueue a prefix of `items` without blocking.
    ///
    /// Accepted values are drained from the front of `items`; the rest stay
    /// with the caller. Returns the number of values enqueued, which is zero
    /// when the queue is full, the cursor race was lost, or `items` is empty.
    fn try_push_batch(&mut self, items: &mut Vec<T>) -> usize;

    /// Fixed slot count of the queue.
    fn capacity(&self) -> usize;

    /// Occupancy estimate; approximate while other threads are active.
    fn len(&self) -> usize;

    /// Whether the occupancy estimate is zero.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueues one value, yielding between attempts until a slot is free.
    fn push(&mut self, value: T) {
        let backoff = Backoff::new();
        let mut value = value;
        loop {
            match self.try_push(value) {
                Ok(()) => return,
                Err(PushError(rejected)) => value = rejected,
            }
            backoff.snooze();
        }
    }

    /// Enqueues every value in `items`, yielding between attempts.
    ///
    /// Partial progress accumulates: each round enqueues whatever prefix
    /// currently fits.
    fn push_batch(&mut self, items: &mut Vec<T>) {
        let backoff = Backoff::new();
        while !items.is_empty() {
            if self.try_push_batch(items) == 0 {
                backoff.snooze();
            } else {
                backoff.reset();
            }
        }
    }
}

/// Consuming half of a ring queue.
pub trait QueueConsumer<T> {
    /// Attempts to dequeue one value without blocking.
    ///
    /// `None` means the queue is empty, the next slot is still being
    /// published, or the cursor race was lost.
    fn try_pop(&mut self) -> Option<T>;

    /// Attempts to dequeue up to `max` values into `out` without blocking.
    ///
    /// Returns the number of values appended.
    fn try_pop_batch(&mut self, out: &mut Vec<T>, max: usize) -> usize;

    /// Fixed slot count of the queue.
    fn capacity(&self) -> usize;

    /// Occupancy estimate; approximate while other threads are active.
    fn len(&self) -> usize;

    /// Whether the occupancy estimate is zero.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dequeues one value, yielding between attempts until one is available.
    fn pop(&mut self) -> T {
        let backoff = Backoff::new();
        loop {
            if let Some(value) = self.try_pop() {
                return value;
            }
            backoff.snooze();
        }
    }

    /// Dequeues exactly `count` values into `out`, yielding between attempts.
    fn pop_batch(&mut self, out: &mut Vec<T>, count: usize) {
        let backoff = Backoff::new();
        let mut remaining = count;
        while remaining > 0 {
            let popped = self.try_pop_batch(out, remaining);
            if popped == 0 {
                backoff.snooze();
            } else {
                remaining -= popped;
                backoff.reset();
            }
        }
    }
}
