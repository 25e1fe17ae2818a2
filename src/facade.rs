//! # Static entry points.
//!
//! [`Defer`] keeps at most one [`ProcessHandler`] per process. It is created on
//! first use from the configured [`Config`] (default if none) and lives until
//! [`Defer::reset`].
//!
//! ```text
//! Defer::global(f) ──┐
//! Defer::terminate ──┼──► handler() ── None ──► build(cfg) + register hooks
//! Defer::handler() ──┘        └─ Some ──► Arc<ProcessHandler>
//!
//! Defer::reset() ──► drop instance (its hook triggers become no-ops)
//! ```
//!
//! ## Example
//! ```rust
//! use taskdefer::{Config, Defer};
//!
//! Defer::configure(Config::without_signals());
//!
//! Defer::global(|| println!("global cleanup"));
//! Defer::terminate(|| println!("after a successful run"), false);
//! Defer::with_scope(|scope| {
//!     scope.task(|| println!("end of scope"));
//! });
//!
//! Defer::handler().execute_process_end();
//! Defer::reset();
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::{Config, ProcessHandler, ScopeHandler};
use crate::hooks;
use crate::tasks::TaskOutput;

struct Slot {
    cfg: Option<Config>,
    handler: Option<Arc<ProcessHandler>>,
}

static SLOT: Mutex<Slot> = Mutex::new(Slot {
    cfg: None,
    handler: None,
});

fn slot() -> MutexGuard<'static, Slot> {
    SLOT.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide deferred-task facade.
#[derive(Debug, Clone, Copy)]
pub struct Defer;

impl Defer {
    /// New independent function scope; drains when dropped.
    ///
    /// Uses the current handler's subscribers if one exists, otherwise the
    /// configured scope capacity and the default log writer. Never creates the
    /// process handler.
    pub fn scope<'a>() -> ScopeHandler<'a> {
        let guard = slot();
        match &guard.handler {
            Some(handler) => handler.create_function_defer(),
            None => {
                let capacity = guard
                    .cfg
                    .as_ref()
                    .map(Config::scope_capacity_clamped)
                    .unwrap_or_else(|| Config::default().scope_capacity_clamped());
                ScopeHandler::with_capacity(capacity)
            }
        }
    }

    /// Runs `f` with a fresh scope and drains the scope afterwards, also when
    /// `f` panics.
    pub fn with_scope<'a, T>(f: impl FnOnce(&mut ScopeHandler<'a>) -> T) -> T {
        let mut scope = Self::scope();
        f(&mut scope)
    }

    /// Pushes a closure onto the process-global stack.
    pub fn global<F, R>(f: F)
    where
        F: FnOnce() -> R + Send + 'static,
        R: TaskOutput + 'static,
    {
        Self::handler().defer(f);
    }

    /// Pushes a closure onto the terminate stack.
    pub fn terminate<F, R>(f: F, run_always: bool)
    where
        F: FnOnce() -> R + Send + 'static,
        R: TaskOutput + 'static,
    {
        Self::handler().terminate(f, run_always);
    }

    /// The process handler, created on first access.
    pub fn handler() -> Arc<ProcessHandler> {
        let mut guard = slot();
        if let Some(handler) = &guard.handler {
            return Arc::clone(handler);
        }
        let cfg = guard.cfg.clone().unwrap_or_default();
        let handler = ProcessHandler::builder(cfg).build();
        guard.handler = Some(Arc::clone(&handler));
        handler
    }

    /// Discards the current handler; the next access builds a fresh one.
    ///
    /// Pending tasks of the discarded handler are dropped without running.
    /// The configuration set by [`Defer::configure`] is kept.
    pub fn reset() {
        let old = slot().handler.take();
        drop(old);
    }

    /// Sets the configuration used the next time a handler is built.
    pub fn configure(cfg: Config) {
        slot().cfg = Some(cfg);
    }

    /// Replaces the current handler with a custom-built one.
    ///
    /// Returns the previous handler, if any.
    pub fn install(handler: Arc<ProcessHandler>) -> Option<Arc<ProcessHandler>> {
        slot().handler.replace(handler)
    }

    /// Reports the end of the current request to the FastCGI request-end hook.
    ///
    /// Returns `false` when no request-end callback is registered.
    pub fn finish_request() -> bool {
        hooks::finish_request()
    }
}
