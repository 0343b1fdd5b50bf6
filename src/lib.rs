//! ringcore - bounded lock-free ring queues and systems-foundation primitives
//!
//! The heart of the crate is a family of bounded, cache-aware ring queues in
//! three concurrency profiles:
//!
//! - [`spsc`] : one producer, one consumer; cursor-only coordination
//! - [`mpsc`] : many producers, one consumer; batch reservation by CAS on the
//!   producer cursor, per-slot sequence publication
//! - [`mpmc`] : many producers, many consumers; classic sequenced ring, one
//!   slot per attempt
//!
//! Every profile offers the same contract through the [`QueueProducer`] and
//! [`QueueConsumer`] traits: non-blocking `try_` operations (single element
//! and batch) and blocking variants that cooperatively yield until they
//! succeed. Capacity is fixed at construction and any positive slot count is
//! accepted; the queues never allocate after construction and never block the
//! OS thread.
//!
//! Which threads may drive which endpoint is enforced by the type system:
//! endpoints of the restricted sides are not `Clone`, so using an SPSC queue
//! from two producing threads is a compile error rather than a data race.
//!
//! ```
//! use ringcore::{QueueConsumer, QueueProducer};
//!
//! let (mut tx, mut rx) = ringcore::spsc::queue::<u64>(8)?;
//! tx.push(7);
//! assert_eq!(rx.pop(), 7);
//! # Ok::<(), ringcore::QueueError>(())
//! ```
//!
//! The crate also carries the small collaborators the queues grew up next to:
//! chunked object pools ([`pool`]), a priority-ordered startup/shutdown
//! registry ([`registry`]) and a thin logging facade over `tracing`
//! ([`logging`]).

#![warn(missing_docs)]

mod block;
mod cache;
mod error;
mod queue;

pub mod logging;
pub mod mpmc;
pub mod mpsc;
pub mod pool;
pub mod registry;
pub mod spsc;

pub use error::{PushError, QueueError};
pub use pool::{ObjectPool, Pooled, SyncObjectPool, SyncPooled};
pub use queue::{QueueConsumer, QueueProducer};
pub use registry::{InitializerRegistry, RegistryError};
