//! Process-global callback list shared by every handler attached to one mechanism.
//!
//! The C runtime, the signal watcher and the request-end entry point exist once
//! per process, but several [`ProcessHandler`](crate::ProcessHandler)s may be alive
//! at the same time. Each attaches its callback here; the list holds only weak
//! references, so a dropped handler's callback disappears on its own.
//!
//! ```text
//! attach(cb)   ─► prune dead, push Weak(cb)
//! fire()       ─► upgrade live entries (lock released) ─► run each, newest first
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::ProcessEndFn;

type WeakEndFn = Weak<dyn Fn() + Send + Sync + 'static>;

pub(crate) struct CallbackSlot {
    entries: Mutex<Vec<WeakEndFn>>,
}

impl CallbackSlot {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Adds `cb`; the caller keeps it alive for as long as it should fire.
    pub(crate) fn attach(&self, cb: &ProcessEndFn) {
        let mut entries = self.lock();
        entries.retain(|w| w.strong_count() > 0);
        entries.push(Arc::downgrade(cb));
    }

    /// Runs every live callback, newest first. Returns how many ran.
    pub(crate) fn fire(&self) -> usize {
        let live: Vec<ProcessEndFn> = {
            let mut entries = self.lock();
            entries.retain(|w| w.strong_count() > 0);
            entries.iter().rev().filter_map(Weak::upgrade).collect()
        };
        for cb in &live {
            let _ = catch_unwind(AssertUnwindSafe(|| cb()));
        }
        live.len()
    }

    /// Number of callbacks still alive.
    pub(crate) fn live(&self) -> usize {
        self.lock().iter().filter(|w| w.strong_count() > 0).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<WeakEndFn>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
