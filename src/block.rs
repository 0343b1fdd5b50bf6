//! Shared storage for the ring queues: the aligned slot buffer, the padded
//! cursors and, for the multi-producer flavors, the per-slot sequence array.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

use crate::cache::AlignedBuffer;
use crate::error::QueueError;

/// Cursor-and-storage block common to all queue flavors.
///
/// `head` counts every element ever dequeued and `tail` every element ever
/// enqueued; both only grow, so live occupancy is `tail - head` and is never
/// above `capacity`. The two cursors sit on distinct cache lines so that
/// enqueuers and dequeuers do not false-share.
pub(crate) struct Block<T> {
    pub(crate) head: CachePadded<AtomicU64>,
    pub(crate) tail: CachePadded<AtomicU64>,
    capacity: usize,
    data: AlignedBuffer<T>,
}

impl<T> Block<T> {
    pub(crate) fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        Ok(Self {
            head: CachePadded::new(AtomicU64::new(0)),
            tail: CachePadded::new(AtomicU64::new(0)),
            capacity,
            data: AlignedBuffer::new(capacity)?,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index of the slot backing position `pos`.
    #[inline]
    pub(crate) fn slot_index(&self, pos: u64) -> usize {
        (pos % self.capacity as u64) as usize
    }

    /// Raw pointer to the slot backing position `pos`.
    ///
    /// # Safety
    ///
    /// The caller must hold the protocol's exclusive claim on `pos`: a
    /// reservation for writes, or an observed publication for reads.
    #[inline]
    pub(crate) unsafe fn slot(&self, pos: u64) -> *mut T {
        // SAFETY: slot_index is always within capacity.
        unsafe { self.data.slot(self.slot_index(pos)) }
    }

    /// Occupancy estimate from two independent acquire loads.
    ///
    /// Under contention the loads may straddle other threads' updates, so the
    /// raw difference can momentarily fall outside `[0, capacity]`; it is
    /// clamped at zero and callers must treat it as approximate.
    pub(crate) fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.saturating_sub(head) as usize
    }

    /// Drops every value in positions `[head, tail)`.
    ///
    /// `&mut self` guarantees no producer or consumer is active.
    pub(crate) fn drop_live(&mut self) {
        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        for pos in head..tail {
            // SAFETY: exclusive access, and without sequences every position
            // in `[head, tail)` holds a live value.
            unsafe { std::ptr::drop_in_place(self.slot(pos)) };
        }
    }
}

/// [`Block`] plus the per-slot sequence array used by MPSC and MPMC.
///
/// `seq[s]` names the next position for which slot `s` is usable: `pos` while
/// the slot is empty for round `pos`, `pos + 1` once a producer published into
/// it, and `pos + capacity` once a consumer retired it to the next round.
pub(crate) struct SeqBlock<T> {
    pub(crate) block: Block<T>,
    seq: AlignedBuffer<AtomicU64>,
}

impl<T> SeqBlock<T> {
    pub(crate) fn new(capacity: usize) -> Result<Self, QueueError> {
        let block = Block::new(capacity)?;
        let seq: AlignedBuffer<AtomicU64> = AlignedBuffer::new(capacity)?;
        for i in 0..capacity {
            // SAFETY: `i` is within capacity; each entry is written once
            // before the block is shared.
            unsafe { seq.slot(i).write(AtomicU64::new(i as u64)) };
        }
        Ok(Self { block, seq })
    }

    /// Sequence atomic for the slot backing position `pos`.
    #[inline]
    pub(crate) fn seq(&self, pos: u64) -> &AtomicU64 {
        // SAFETY: slot_index is within capacity and the array was fully
        // initialized in `new`.
        unsafe { &*self.seq.slot(self.block.slot_index(pos)) }
    }

    /// Drops every published value in `[head, tail)`, skipping slots whose
    /// sequence shows the publication never completed.
    pub(crate) fn drop_live(&mut self) {
        let head = *self.block.head.get_mut();
        let tail = *self.block.tail.get_mut();
        for pos in head..tail {
            let idx = self.block.slot_index(pos);
            // SAFETY: exclusive access; the array was initialized in `new`.
            let seq = unsafe { &mut *self.seq.slot(idx) };
            if *seq.get_mut() == pos + 1 {
                // SAFETY: the sequence confirms the slot holds a live value.
                unsafe { std::ptr::drop_in_place(self.block.slot(pos)) };
            }
        }
    }
}
