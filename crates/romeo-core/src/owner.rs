//! Single-writer check for state owned by one logical thread.

use std::cell::OnceCell;
use std::thread::{self, ThreadId};

/// Remembers the first thread that mutated the owning state.
///
/// Every later mutation must come from that same thread. The check only runs
/// in debug builds; release builds trust the integrator to marshal calls.
#[derive(Debug, Clone, Default)]
pub(crate) struct OwningThread {
    owner: OnceCell<ThreadId>,
}

impl OwningThread {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn check(&self, operation: &'static str) {
        if cfg!(debug_assertions) {
            let current = thread::current().id();
            let owner = *self.owner.get_or_init(|| current);
            debug_assert_eq!(
                owner, current,
                "{operation} called off the thread that owns this state"
            );
        }
    }
}
