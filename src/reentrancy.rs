//! Debug-only guard against user `Hash`/`Eq` code re-entering a container.
//!
//! While a container hashes a key or walks a bucket it calls into the key
//! type. A key implementation that reaches back into the same container at
//! that point would observe it mid-operation. In debug builds the guard
//! records which operation is running and panics on nested entry, naming
//! both operations. In release builds the check compiles to nothing, but the
//! tracker stays `!Sync` so containers expose the same auto traits in every
//! build profile.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-container tracker; guard user-code windows with
/// `let _g = self.reentrancy.enter("lookup");`.
#[derive(Debug, Default)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    _nosync: PhantomData<Cell<()>>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosync: PhantomData,
        }
    }

    /// Marks `op` as running until the returned guard is dropped.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.replace(Some(op)) {
                panic!("reentrancy detected: `{op}` entered while `{outer}` is running");
            }
            ReentrancyGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            ReentrancyGuard { _owner: PhantomData }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_active(&self) -> bool {
        #[cfg(debug_assertions)]
        {
            self.active.get().is_some()
        }
        #[cfg(not(debug_assertions))]
        {
            false
        }
    }
}

/// RAII guard returned by [`DebugReentrancy::enter`].
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a DebugReentrancy>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let prev = self.owner.active.take();
            debug_assert!(prev.is_some());
        }
    }
}
