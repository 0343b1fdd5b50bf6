//! Chunked object pools.
//!
//! Storage grows by fixed-size chunks that are never moved or shrunk;
//! released slots are recycled through a LIFO free list, so a busy pool
//! reaches a steady state with no allocator traffic at all. [`ObjectPool`]
//! is single-threaded; [`SyncObjectPool`] guards the same allocator with a
//! mutex. Both hand out RAII guards instead of raw pointers: dropping the
//! guard destructs the value and reclaims its slot. Leaking a guard leaks
//! the value but stays memory-safe.

use std::cell::RefCell;
use std::mem::MaybeUninit;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use parking_lot::Mutex;
use tracing::debug;

const DEFAULT_CHUNK_CAPACITY: usize = 1024;

/// Allocation state shared by both pool flavors.
struct PoolCore<T> {
    chunks: Vec<Box<[MaybeUninit<T>]>>,
    /// Offset of the next fresh slot in the last chunk.
    next_slot: usize,
    free: Vec<NonNull<T>>,
    chunk_capacity: usize,
    live: usize,
}

impl<T> PoolCore<T> {
    fn new(chunk_capacity: usize) -> Self {
        assert!(chunk_capacity > 0, "chunk capacity must be greater than zero");
        Self {
            chunks: Vec::new(),
            next_slot: 0,
            free: Vec::new(),
            chunk_capacity,
            live: 0,
        }
    }

    fn acquire(&mut self, value: T) -> NonNull<T> {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                if self.chunks.is_empty() || self.next_slot == self.chunk_capacity {
                    let mut chunk = Vec::with_capacity(self.chunk_capacity);
                    chunk.resize_with(self.chunk_capacity, MaybeUninit::uninit);
                    self.chunks.push(chunk.into_boxed_slice());
                    self.next_slot = 0;
                    debug!(chunks = self.chunks.len(), "object pool grew");
                }
                let index = self.next_slot;
                self.next_slot += 1;
                let chunk = self.chunks.last_mut().expect("chunk pushed above");
                NonNull::from(&mut chunk[index]).cast::<T>()
            }
        };
        // SAFETY: the slot is either fresh or was released (and destructed);
        // either way it holds no live value.
        unsafe { slot.as_ptr().write(value) };
        self.live += 1;
        slot
    }

    /// # Safety
    ///
    /// `slot` must have come from `acquire` on this pool, hold a live value,
    /// and not be released twice.
    unsafe fn release(&mut self, slot: NonNull<T>) {
        // SAFETY: per the contract the slot holds a live value.
        unsafe { std::ptr::drop_in_place(slot.as_ptr()) };
        self.free.push(slot);
        self.live -= 1;
    }

    fn len(&self) -> usize {
        self.live
    }

    fn capacity(&self) -> usize {
        self.chunks.len() * self.chunk_capacity
    }
}

// SAFETY: the raw slot pointers target heap chunks owned by the core; they
// move with it and are only dereferenced by whoever holds the value's guard.
unsafe impl<T: Send> Send for PoolCore<T> {}

/// Single-threaded chunked object pool.
///
/// ```
/// let pool = ringcore::ObjectPool::<String>::new();
/// let greeting = pool.acquire(String::from("hello"));
/// assert_eq!(greeting.len(), 5);
/// drop(greeting);
/// assert!(pool.is_empty());
/// ```
pub struct ObjectPool<T> {
    core: RefCell<PoolCore<T>>,
}

impl<T> ObjectPool<T> {
    /// Creates a pool with the default chunk capacity of 1024 slots.
    pub fn new() -> Self {
        Self::with_chunk_capacity(DEFAULT_CHUNK_CAPACITY)
    }

    /// Creates a pool growing by `chunk_capacity` slots at a time.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_capacity` is zero.
    pub fn with_chunk_capacity(chunk_capacity: usize) -> Self {
        Self {
            core: RefCell::new(PoolCore::new(chunk_capacity)),
        }
    }

    /// Moves `value` into a pooled slot and returns the guard owning it.
    pub fn acquire(&self, value: T) -> Pooled<'_, T> {
        Pooled {
            slot: self.core.borrow_mut().acquire(value),
            pool: self,
        }
    }

    /// Number of values currently alive in the pool.
    pub fn len(&self) -> usize {
        self.core.borrow().len()
    }

    /// Whether no values are currently alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total slots across all chunks allocated so far.
    pub fn capacity(&self) -> usize {
        self.core.borrow().capacity()
    }
}

impl<T> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard over a value held in an [`ObjectPool`].
pub struct Pooled<'a, T> {
    slot: NonNull<T>,
    pool: &'a ObjectPool<T>,
}

impl<T> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard owns the slot until dropped.
        unsafe { self.slot.as_ref() }
    }
}

impl<T> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as in `deref`, and `&mut self` gives unique access.
        unsafe { self.slot.as_mut() }
    }
}

impl<T> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        // SAFETY: the slot came from this pool and the guard is its only
        // owner.
        unsafe { self.pool.core.borrow_mut().release(self.slot) };
    }
}

/// Thread-safe chunked object pool.
///
/// The allocator is the same as [`ObjectPool`]'s behind a mutex; acquisition
/// and release each take the lock once, access through the guard is free.
pub struct SyncObjectPool<T> {
    core: Mutex<PoolCore<T>>,
}

impl<T: Send> SyncObjectPool<T> {
    /// Creates a pool with the default chunk capacity of 1024 slots.
    pub fn new() -> Self {
        Self::with_chunk_capacity(DEFAULT_CHUNK_CAPACITY)
    }

    /// Creates a pool growing by `chunk_capacity` slots at a time.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_capacity` is zero.
    pub fn with_chunk_capacity(chunk_capacity: usize) -> Self {
        Self {
            core: Mutex::new(PoolCore::new(chunk_capacity)),
        }
    }

    /// Moves `value` into a pooled slot and returns the guard owning it.
    pub fn acquire(&self, value: T) -> SyncPooled<'_, T> {
        SyncPooled {
            slot: self.core.lock().acquire(value),
            pool: self,
        }
    }

    /// Number of values currently alive in the pool.
    pub fn len(&self) -> usize {
        self.core.lock().len()
    }

    /// Whether no values are currently alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total slots across all chunks allocated so far.
    pub fn capacity(&self) -> usize {
        self.core.lock().capacity()
    }
}

impl<T: Send> Default for SyncObjectPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: every slot pointer is owned by exactly one guard, and the core
// behind the mutex only manages storage; sharing the pool is safe whenever
// the values themselves may cross threads.
unsafe impl<T: Send> Sync for SyncObjectPool<T> {}

/// RAII guard over a value held in a [`SyncObjectPool`].
pub struct SyncPooled<'a, T: Send> {
    slot: NonNull<T>,
    pool: &'a SyncObjectPool<T>,
}

// SAFETY: the guard is the sole owner of its slot's value.
unsafe impl<T: Send> Send for SyncPooled<'_, T> {}
unsafe impl<T: Send + Sync> Sync for SyncPooled<'_, T> {}

impl<T: Send> Deref for SyncPooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard owns the slot until dropped.
        unsafe { self.slot.as_ref() }
    }
}

impl<T: Send> DerefMut for SyncPooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as in `deref`, and `&mut self` gives unique access.
        unsafe { self.slot.as_mut() }
    }
}

impl<T: Send> Drop for SyncPooled<'_, T> {
    fn drop(&mut self) {
        // SAFETY: the slot came from this pool and the guard is its only
        // owner.
        unsafe { self.pool.core.lock().release(self.slot) };
    }
}
