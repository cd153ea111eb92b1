//! Single-flight storage for singleton instances.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

use super::dependencies::AnyArc;
use crate::error::DiResult;

#[cfg(feature = "parking-lot")]
type SlotLock<T> = parking_lot::Mutex<T>;
#[cfg(not(feature = "parking-lot"))]
type SlotLock<T> = std::sync::Mutex<T>;

/// Cached singleton value.
///
/// The cell caches the in-flight production, not just the settled value:
/// callers arriving while the first initializer is suspended wait on the
/// same cell instead of starting a second production. Disposal swaps in a
/// fresh cell so a later request produces a new instance.
pub(crate) struct SingletonSlot {
    cell: SlotLock<Arc<OnceCell<AnyArc>>>,
}

impl SingletonSlot {
    pub(crate) fn new() -> Self {
        Self {
            cell: SlotLock::new(Arc::new(OnceCell::new())),
        }
    }

    #[cfg(feature = "parking-lot")]
    fn with_cell<R>(&self, f: impl FnOnce(&mut Arc<OnceCell<AnyArc>>) -> R) -> R {
        f(&mut self.cell.lock())
    }

    #[cfg(not(feature = "parking-lot"))]
    fn with_cell<R>(&self, f: impl FnOnce(&mut Arc<OnceCell<AnyArc>>) -> R) -> R {
        // A panicking teardown must not wedge the slot for every later caller.
        let mut guard = self.cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Returns the cached instance, producing it with `produce` if needed.
    ///
    /// A failed production leaves the cell empty; the next caller retries.
    pub(crate) async fn get_or_try_init<F, Fut>(&self, produce: F) -> DiResult<AnyArc>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DiResult<AnyArc>>,
    {
        let cell = self.with_cell(|cell| cell.clone());
        cell.get_or_try_init(produce).await.cloned()
    }

    #[cfg(test)]
    pub(crate) fn get(&self) -> Option<AnyArc> {
        self.with_cell(|cell| cell.get().cloned())
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.with_cell(|cell| cell.initialized())
    }

    /// Clears the slot, returning the instance that was cached, if any.
    ///
    /// A production still in flight completes into the detached cell and is
    /// not observed by later requests.
    pub(crate) fn take(&self) -> Option<AnyArc> {
        self.with_cell(|cell| {
            let previous = std::mem::replace(cell, Arc::new(OnceCell::new()));
            previous.get().cloned()
        })
    }
}
