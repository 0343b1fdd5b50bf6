//! Multi-producer single-consumer queue.
//!
//! Producers reserve a contiguous run of positions with one CAS on `tail`,
//! bounded to slots whose sequence shows the consumer has already retired
//! them. Publication is then per slot: after moving a value in, the producer
//! releases `seq = pos + 1`. The lone consumer walks the published prefix,
//! moves values out and retires each slot with `seq = pos + capacity`.
//!
//! A run reserved by one producer is dequeued as a contiguous block, so each
//! producer's submission order survives; ordering across producers is
//! whatever the CAS winners make it.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::block::SeqBlock;
use crate::error::{PushError, QueueError};
use crate::queue::{QueueConsumer, QueueProducer};

/// Creates a bounded MPSC queue, returning its two endpoints.
///
/// The [`Producer`] may be cloned freely and driven from any number of
/// threads; the [`Consumer`] is not `Clone` and belongs to exactly one.
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
    /// Safe under any number of concurrent callers.
    fn push(&self, value: T) -> Result<(), PushError<T>> {
        let block = &self.shared.block;
        let pos = block.tail.load(Ordering::Relaxed);
        let head = block.head.load(Ordering::Acquire);
        if pos == head + block.capacity() as u64 {
            return Err(PushError(value));
        }
        if self.shared.seq(pos).load(Ordering::Acquire) != pos {
            // Slot not yet retired to this round.
            return Err(PushError(value));
        }
        if block
            .tail
            .compare_exchange_weak(pos, pos + 1, Ordering::Release, Ordering::Relaxed)
            .is_err()
        {
            return Err(PushError(value));
        }
        // SAFETY: the winning CAS granted this producer position `pos`.
        unsafe { block.slot(pos).write(value) };
        self.shared.seq(pos).store(pos + 1, Ordering::Release);
        Ok(())
    }

    /// Safe under any number of concurrent callers.
    ///
    /// Reserves the longest admissible prefix with one CAS; a lost CAS means
    /// nothing was claimed and zero is returned with `items` untouched.
    fn push_batch(&self, items: &mut Vec<T>) -> usize {
        let block = &self.shared.block;
        let capacity = block.capacity() as u64;
        let pos = block.tail.load(Ordering::Relaxed);
        let head = block.head.load(Ordering::Acquire);
        let free = head + capacity - pos;
        let want = (items.len() as u64).min(free);
        if want == 0 {
            return 0;
        }
        // Longest prefix of slots already retired to this round; stop at the
        // first slot the consumer still owes us.
        let mut count = 0u64;
        while count < want && self.shared.seq(pos + count).load(Ordering::Acquire) == pos + count {
            count += 1;
        }
        if count == 0 {
            return 0;
        }
        if block
            .tail
            .compare_exchange_weak(pos, pos + count, Ordering::Release, Ordering::Relaxed)
            .is_err()
        {
            return 0;
        }
        for (i, value) in items.drain(..count as usize).enumerate() {
            let at = pos + i as u64;
            // SAFETY: the winning CAS granted this producer `[pos, pos+count)`.
            unsafe { block.slot(at).write(value) };
            self.shared.seq(at).store(at + 1, Ordering::Release);
        }
        count as usize
    }

    /// # Safety
    ///
    /// Must only be called from the single consumer.
    unsafe fn pop(&self) -> Option<T> {
        let block = &self.shared.block;
        let head = block.head.load(Ordering::Relaxed);
        if head == block.tail.load(Ordering::Acquire) {
            return None;
        }
        if self.shared.seq(head).load(Ordering::Acquire) != head + 1 {
            // Reserved but not yet published.
            return None;
        }
        // SAFETY: the sequence confirms publication and only this consumer
        // advances `head`.
        let value = unsafe { block.slot(head).read() };
        self.shared
            .seq(head)
            .store(head + block.capacity() as u64, Ordering::Release);
        block.head.store(head + 1, Ordering::Release);
        Some(value)
    }

    /// # Safety
    ///
    /// Must only be called from the single consumer.
    unsafe fn pop_batch(&self, out: &mut Vec<T>, max: usize) -> usize {
        let block = &self.shared.block;
        let capacity = block.capacity() as u64;
        let head = block.head.load(Ordering::Relaxed);
        let tail = block.tail.load(Ordering::Acquire);
        let limit = (tail - head).min(max as u64);
        // Longest contiguous published run; a producer mid-publish ends it.
        let mut count = 0u64;
        while count < limit
            && self.shared.seq(head + count).load(Ordering::Acquire) == head + count + 1
        {
            count += 1;
        }
        if count == 0 {
            return 0;
        }
        out.reserve(count as usize);
        for i in 0..count {
            let at = head + i;
            // SAFETY: the scan above observed each slot's publication.
            out.push(unsafe { block.slot(at).read() });
            self.shared.seq(at).store(at + capacity, Ordering::Release);
        }
        block.head.store(head + count, Ordering::Release);
        count as usize
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        self.shared.drop_live();
    }
}

/// Producing endpoint of an MPSC queue. Clone one per producing thread.
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

/// Consuming endpoint of an MPSC queue. Not `Clone`; owned by one thread.
pub struct Consumer<T> {
    ring: Arc<Ring<T>>,
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
        // SAFETY: `&mut self` on the sole, non-`Clone` consumer endpoint
        // makes this the only consuming call site.
        unsafe { self.ring.pop() }
    }

    fn try_pop_batch(&mut self, out: &mut Vec<T>, max: usize) -> usize {
        // SAFETY: as in `try_pop`.
        unsafe { self.ring.pop_batch(out, max) }
    }

    fn capacity(&self) -> usize {
        self.ring.shared.block.capacity()
    }

    fn len(&self) -> usize {
        self.ring.shared.block.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke() {
        let (mut tx, mut rx) = queue::<i32>(4).unwrap();
        assert!(tx.try_push(1).is_ok());
        assert!(tx.try_push(2).is_ok());
        assert_eq!(rx.try_pop(), Some(1));
        assert_eq!(rx.try_pop(), Some(2));
        assert_eq!(rx.try_pop(), None);
    }

    #[test]
    fn batch_respects_free_space() {
        let (mut tx, mut rx) = queue::<i32>(4).unwrap();
        let mut items = vec![1, 2, 3, 4, 5, 6];
        assert_eq!(tx.try_push_batch(&mut items), 4);
        assert_eq!(items, [5, 6]);
        assert_eq!(tx.try_push_batch(&mut items), 0);

        let mut out = Vec::new();
        assert_eq!(rx.try_pop_batch(&mut out, 2), 2);
        assert_eq!(tx.try_push_batch(&mut items), 2);
        assert!(items.is_empty());

        assert_eq!(rx.try_pop_batch(&mut out, usize::MAX), 4);
        assert_eq!(out, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn slot_reuse_across_rounds() {
        let (mut tx, mut rx) = queue::<u64>(3).unwrap();
        for round in 0..10u64 {
            for i in 0..3 {
                assert!(tx.try_push(round * 10 + i).is_ok());
            }
            for i in 0..3 {
                assert_eq!(rx.try_pop(), Some(round * 10 + i));
            }
        }
    }
}
