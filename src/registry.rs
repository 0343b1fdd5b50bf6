//! Priority-ordered startup/shutdown registry.
//!
//! Subsystems register a named pair of callbacks with a priority; a single
//! `initialize` call runs the initialize callbacks in ascending priority
//! order, and `shutdown` unwinds them in reverse. Registration order breaks
//! priority ties (the sort is stable).

use std::sync::OnceLock;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

/// Errors from registry phase transitions.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// `initialize` was called while the registry was already initialized.
    #[error("registry is already initialized")]
    AlreadyInitialized,
    /// `shutdown` was called before `initialize`.
    #[error("registry is not initialized")]
    NotInitialized,
}

type Callback = Box<dyn FnMut() + Send>;

struct Entry {
    name: String,
    initialize: Callback,
    shutdown: Callback,
    priority: i32,
}

#[derive(Default)]
struct Inner {
    entries: Vec<Entry>,
    initialized: bool,
}

/// Priority-ordered list of startup/shutdown hooks.
///
/// A process-wide instance is reachable through [`InitializerRegistry::global`];
/// independent instances can also be constructed, which tests and embedded
/// uses prefer.
pub struct InitializerRegistry {
    inner: Mutex<Inner>,
}

impl InitializerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static InitializerRegistry {
        static GLOBAL: OnceLock<InitializerRegistry> = OnceLock::new();
        GLOBAL.get_or_init(InitializerRegistry::new)
    }

    /// Registers a named callback pair. Lower priorities initialize first;
    /// shutdown runs in the reverse of the initialization order. Use an empty
    /// closure for a side that has nothing to do.
    pub fn register<I, S>(&self, name: &str, priority: i32, initialize: I, shutdown: S)
    where
        I: FnMut() + Send + 'static,
        S: FnMut() + Send + 'static,
    {
        self.inner.lock().entries.push(Entry {
            name: name.to_owned(),
            initialize: Box::new(initialize),
            shutdown: Box::new(shutdown),
            priority,
        });
    }

    /// Runs every initialize callback in ascending priority order.
    pub fn initialize(&self) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock();
        if inner.initialized {
            return Err(RegistryError::AlreadyInitialized);
        }
        inner.entries.sort_by_key(|entry| entry.priority);
        for entry in &mut inner.entries {
            debug!(name = %entry.name, priority = entry.priority, "initializing");
            (entry.initialize)();
        }
        inner.initialized = true;
        Ok(())
    }

    /// Runs every shutdown callback in the reverse of the initialization
    /// order, returning the registry to its uninitialized state.
    pub fn shutdown(&self) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock();
        if !inner.initialized {
            return Err(RegistryError::NotInitialized);
        }
        for entry in inner.entries.iter_mut().rev() {
            debug!(name = %entry.name, "shutting down");
            (entry.shutdown)();
        }
        inner.initialized = false;
        Ok(())
    }
}

impl Default for InitializerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> impl FnMut() + Send + 'static {
        let log = Arc::clone(log);
        let tag = tag.to_owned();
        move || log.lock().push(tag.clone())
    }

    #[test]
    fn runs_in_priority_order_and_reverses_on_shutdown() {
        let registry = InitializerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        registry.register("mid", 0, recorder(&log, "init mid"), recorder(&log, "down mid"));
        registry.register("late", 1, recorder(&log, "init late"), recorder(&log, "down late"));
        registry.register("early", -1, recorder(&log, "init early"), recorder(&log, "down early"));

        registry.initialize().unwrap();
        registry.shutdown().unwrap();

        assert_eq!(
            *log.lock(),
            [
                "init early",
                "init mid",
                "init late",
                "down late",
                "down mid",
                "down early",
            ]
        );
    }

    #[test]
    fn rejects_double_initialize() {
        let registry = InitializerRegistry::new();
        registry.initialize().unwrap();
        assert_eq!(registry.initialize(), Err(RegistryError::AlreadyInitialized));
    }

    #[test]
    fn rejects_shutdown_before_initialize() {
        let registry = InitializerRegistry::new();
        assert_eq!(registry.shutdown(), Err(RegistryError::NotInitialized));
    }

    #[test]
    fn reinitializes_after_shutdown() {
        static RUNS: AtomicUsize = AtomicUsize::new(0);

        let registry = InitializerRegistry::new();
        registry.register("counter", 0, || {
            RUNS.fetch_add(1, Ordering::Relaxed);
        }, || {});

        registry.initialize().unwrap();
        registry.shutdown().unwrap();
        registry.initialize().unwrap();
        assert_eq!(RUNS.load(Ordering::Relaxed), 2);
    }
}
