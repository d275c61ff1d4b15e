//! Snapshot-published dispatcher for registration after serving has started.
//!
//! Readers load the current [`Dispatcher`] from an [`ArcSwap`] and match against
//! it without taking any lock. Writers serialise on a mutex, register into a
//! clone of the current dispatcher and publish the clone in one atomic store.
//! A reader therefore sees either the tree before a registration or the tree
//! after it, never a half-built one.

use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

use super::core::{BoxedHandler, DispatchOutcome, Dispatcher};
use crate::router::{NodeId, RouteError};

/// A [`Dispatcher`] that can be read and extended concurrently
pub struct SharedDispatcher<C> {
    current: ArcSwap<Dispatcher<C>>,
    writer: Mutex<()>,
    generation: AtomicU64,
}

impl<C> Default for SharedDispatcher<C> {
    fn default() -> Self {
        Self::new(Dispatcher::new())
    }
}

impl<C> SharedDispatcher<C> {
    /// Publish `dispatcher` as the initial snapshot
    #[must_use]
    pub fn new(dispatcher: Dispatcher<C>) -> Self {
        Self {
            current: ArcSwap::from_pointee(dispatcher),
            writer: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// The currently published dispatcher
    #[must_use]
    pub fn snapshot(&self) -> Arc<Dispatcher<C>> {
        self.current.load_full()
    }

    /// Number of snapshots published since construction
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Dispatch against the current snapshot
    pub fn dispatch(&self, method: &str, path: &str, ctx: &mut C) -> DispatchOutcome {
        self.current.load().dispatch(method, path, ctx)
    }

    /// Apply `change` to a copy of the current dispatcher and publish it
    ///
    /// # Errors
    ///
    /// Returns the error from `change`; the published snapshot is left as it was.
    pub fn update<F, T>(&self, change: F) -> Result<T, RouteError>
    where
        F: FnOnce(&mut Dispatcher<C>) -> Result<T, RouteError>,
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = Dispatcher::clone(&self.current.load());
        let out = change(&mut next)?;
        self.publish(next);
        Ok(out)
    }

    fn publish(&self, next: Dispatcher<C>) {
        self.current.store(Arc::new(next));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!(generation, "Published dispatcher snapshot");
    }

    /// Register a route and publish the result
    ///
    /// # Errors
    ///
    /// Any [`RouteError`] from compiling the pattern.
    pub fn add_route(
        &self,
        method: &str,
        pattern: &str,
        handlers: &[BoxedHandler<C>],
    ) -> Result<Vec<NodeId>, RouteError> {
        self.update(|d| d.add_route(method, pattern, handlers))
    }

    /// Append middleware and publish the result
    pub fn use_middleware<I>(&self, handlers: I)
    where
        I: IntoIterator<Item = BoxedHandler<C>>,
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = Dispatcher::clone(&self.current.load());
        next.use_middleware(handlers);
        self.publish(next);
    }
}
