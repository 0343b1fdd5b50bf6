//! Single-producer single-consumer queue.
//!
//! With one thread on each side the cursors alone coordinate everything: the
//! producer publishes written slots with a release store of `tail`, the
//! consumer recycles storage with a release store of `head`, and each side
//! acquire-loads the other's cursor. No per-slot state is needed.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::block::Block;
use crate::error::{PushError, QueueError};
use crate::queue::{QueueConsumer, QueueProducer};

/// Creates a bounded SPSC queue, returning its two endpoints.
///
/// Neither endpoint is `Clone`: exactly one thread may produce and exactly
/// one may consume. `capacity` may be any positive slot count.
pub fn queue<T>(capacity: usize) -> Result<(Producer<T>, Consumer<T>), QueueError> {
    let ring = Arc::new(Ring {
        block: Block::new(capacity)?,
    });
    Ok((
        Producer {
            ring: Arc::clone(&ring),
        },
        Consumer { ring },
    ))
}

struct Ring<T> {
    block: Block<T>,
}

impl<T> Ring<T> {
    /// # Safety
    ///
    /// Must only be called from the single producer.
    unsafe fn push(&self, value: T) -> Result<(), PushError<T>> {
        let block = &self.block;
        let tail = block.tail.load(Ordering::Relaxed);
        let head = block.head.load(Ordering::Acquire);
        if tail == head + block.capacity() as u64 {
            return Err(PushError(value));
        }
        // SAFETY: the slot at `tail` was recycled by the `head` observed
        // above and only this producer writes slots.
        unsafe { block.slot(tail).write(value) };
        block.tail.store(tail + 1, Ordering::Release);
        Ok(())
    }

    /// # Safety
    ///
    /// Must only be called from the single producer.
    unsafe fn push_batch(&self, items: &mut Vec<T>) -> usize {
        let block = &self.block;
        let tail = block.tail.load(Ordering::Relaxed);
        let head = block.head.load(Ordering::Acquire);
        let free = head + block.capacity() as u64 - tail;
        let count = (items.len() as u64).min(free) as usize;
        if count == 0 {
            return 0;
        }
        for (i, value) in items.drain(..count).enumerate() {
            // SAFETY: positions `[tail, tail + count)` were recycled by the
            // observed `head` and belong to this producer.
            unsafe { block.slot(tail + i as u64).write(value) };
        }
        block.tail.store(tail + count as u64, Ordering::Release);
        count
    }

    /// # Safety
    ///
    /// Must only be called from the single consumer.
    unsafe fn pop(&self) -> Option<T> {
        let block = &self.block;
        let head = block.head.load(Ordering::Relaxed);
        let tail = block.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        // SAFETY: the slot at `head` was published by the release store of
        // the `tail` observed above.
        let value = unsafe { block.slot(head).read() };
        block.head.store(head + 1, Ordering::Release);
        Some(value)
    }

    /// # Safety
    ///
    /// Must only be called from the single consumer.
    unsafe fn pop_batch(&self, out: &mut Vec<T>, max: usize) -> usize {
        let block = &self.block;
        let head = block.head.load(Ordering::Relaxed);
        let tail = block.tail.load(Ordering::Acquire);
        let count = (tail - head).min(max as u64) as usize;
        if count == 0 {
            return 0;
        }
        out.reserve(count);
        for i in 0..count {
            // SAFETY: every position up to the observed `tail` is published.
            out.push(unsafe { block.slot(head + i as u64).read() });
        }
        block.head.store(head + count as u64, Ordering::Release);
        count
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        self.block.drop_live();
    }
}

/// Producing endpoint of an SPSC queue. Not `Clone`; owned by one thread.
pub struct Producer<T> {
    ring: Arc<Ring<T>>,
}

/// Consuming endpoint of an SPSC queue. Not `Clone`; owned by one thread.
pub struct Consumer<T> {
    ring: Arc<Ring<T>>,
}

impl<T> QueueProducer<T> for Producer<T> {
    fn try_push(&mut self, value: T) -> Result<(), PushError<T>> {
        // SAFETY: `&mut self` on the sole, non-`Clone` producer endpoint
        // makes this the only producing call site.
        unsafe { self.ring.push(value) }
    }

    fn try_push_batch(&mut self, items: &mut Vec<T>) -> usize {
        // SAFETY: as in `try_push`.
        unsafe { self.ring.push_batch(items) }
    }

    fn capacity(&self) -> usize {
        self.ring.block.capacity()
    }

    fn len(&self) -> usize {
        self.ring.block.len()
    }
}

impl<T> QueueConsumer<T> for Consumer<T> {
    fn try_pop(&mut self) -> Option<T> {
        // SAFETY: `&mut self` on the sole, non-`Clone` consumer endpoint
        // makes this the only consuming call site.
        unsafe { self.ring.pop() }
    }

    fn try_pop_batch(&mut self, out: &mut Vec<T>, max: usize) -> usize {
        // SAFETY: as in `try_pop`.
        unsafe { self.ring.pop_batch(out, max) }
    }

    fn capacity(&self) -> usize {
        self.ring.block.capacity()
    }

    fn len(&self) -> usize {
        self.ring.block.len()
    }
}
