//! Multi-producer multi-consumer queue (sequenced ring).
//!
//! Both sides claim one position per attempt: check the slot's sequence, CAS
//! the cursor forward, then move the value and flip the sequence. Batch
//! operations iterate the single-slot protocol and stop at the first failure;
//! a batch is deliberately not atomic across contending producers.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::block::SeqBlock;
use crate::error::{PushError, QueueError};
use crate::queue::{QueueConsumer, QueueProducer};

/// Creates a bounded MPMC queue, returning its two endpoints.
///
/// Both endpoints are `Clone`; any number of threads may drive either side.
pub fn queue<T>(capacity: usize) -> Result<(Producer<T>, Consumer<T>), QueueError> {
    let ring = Arc::new(Ring {
        shared: SeqBlock::new(capacity)?,
    });
    Ok((
        Producer {
            ring: Arc::clone(&ring),
        },
        Consumer { ring },
    ))
}

struct Ring<T> {
    shared: SeqBlock<T>,
}

impl<T> Ring<T> {
    fn push(&self, value: T) -> Result<(), PushError<T>> {
        let block = &self.shared.block;
        let capacity = block.capacity() as u64;
        let pos = block.tail.load(Ordering::Relaxed);
        if pos + 1 > block.head.load(Ordering::Acquire) + capacity {
            return Err(PushError(value));
        }
        if self.shared.seq(pos).load(Ordering::Acquire) != pos {
            return Err(PushError(value));
        }
        if block
            .tail
            .compare_exchange_weak(pos, pos + 1, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return Err(PushError(value));
        }
        // SAFETY: winning the CAS after observing `seq == pos` grants this
        // producer exclusive write access to the slot for round `pos`.
        unsafe { block.slot(pos).write(value) };
        self.shared.seq(pos).store(pos + 1, Ordering::Release);
        Ok(())
    }

    fn pop(&self) -> Option<T> {
        let block = &self.shared.block;
        let capacity = block.capacity() as u64;
        let pos = block.head.load(Ordering::Relaxed);
        if pos == block.tail.load(Ordering::Acquire) {
            return None;
        }
        if self.shared.seq(pos).load(Ordering::Acquire) != pos + 1 {
            return None;
        }
        if block
            .head
            .compare_exchange_weak(pos, pos + 1, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return None;
        }
        // SAFETY: winning the CAS after observing `seq == pos + 1` grants
        // this consumer exclusive read access to the slot for round `pos`.
        let value = unsafe { block.slot(pos).read() };
        self.shared.seq(pos).store(pos + capacity, Ordering::Release);
        Some(value)
    }

    fn push_batch(&self, items: &mut Vec<T>) -> usize {
        let mut pushed = 0;
        let mut drained = std::mem::take(items).into_iter();
        while let Some(value) = drained.next() {
            match self.push(value) {
                Ok(()) => pushed += 1,
                Err(PushError(rejected)) => {
                    items.push(rejected);
                    items.extend(drained);
                    return pushed;
                }
            }
        }
        pushed
    }

    fn pop_batch(&self, out: &mut Vec<T>, max: usize) -> usize {
        let mut popped = 0;
        while popped < max {
            match self.pop() {
                Some(value) => {
                    out.push(value);
                    popped += 1;
                }
                None => break,
            }
        }
        popped
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        self.shared.drop_live();
    }
}

/// Producing endpoint of an MPMC queue. Clone one per producing thread.
pub struct Producer<T> {
    ring: Arc<Ring<T>>,
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self {
            ring: Arc::clone(&self.ring),
        }
    }
}

/// Consuming endpoint of an MPMC queue. Clone one per consuming thread.
pub struct Consumer<T> {
    ring: Arc<Ring<T>>,
}

impl<T> Clone for Consumer<T> {
    fn clone(&self) -> Self {
        Self {
            ring: Arc::clone(&self.ring),
        }
    }
}

impl<T> QueueProducer<T> for Producer<T> {
    fn try_push(&mut self, value: T) -> Result<(), PushError<T>> {
        self.ring.push(value)
    }

    fn try_push_batch(&mut self, items: &mut Vec<T>) -> usize {
        self.ring.push_batch(items)
    }

    fn capacity(&self) -> usize {
        self.ring.shared.block.capacity()
    }

    fn len(&self) -> usize {
        self.ring.shared.block.len()
    }
}

impl<T> QueueConsumer<T> for Consumer<T> {
    fn try_pop(&mut self) -> Option<T> {
        self.ring.pop()
    }

    fn try_pop_batch(&mut self, out: &mut Vec<T>, max: usize) -> usize {
        self.ring.pop_batch(out, max)
    }

    fn capacity(&self) -> usize {
        self.ring.shared.block.capacity()
    }

    fn len(&self) -> usize {
        self.ring.shared.block.len()
    }
}
