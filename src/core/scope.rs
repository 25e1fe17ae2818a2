//! # Function-scope deferred tasks.
//!
//! [`ScopeHandler`] owns one bounded stack (default capacity 50) of tasks that
//! may borrow from the enclosing frame. Tasks run newest-first either on an
//! explicit [`ScopeHandler::execute_all`] or when the handler is dropped,
//! whichever comes first; a task never runs twice.
//!
//! ## Example
//! ```rust
//! use std::cell::RefCell;
//! use taskdefer::ScopeHandler;
//!
//! let log = RefCell::new(Vec::new());
//! {
//!     let mut scope = ScopeHandler::new();
//!     scope
//!         .task(|| log.borrow_mut().push("close file"))
//!         .task(|| log.borrow_mut().push("release lock"));
//!     // scope dropped here
//! }
//! assert_eq!(*log.borrow(), ["release lock", "close file"]);
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use crate::core::config::SCOPE_CAPACITY;
use crate::core::runner::{self, DrainSummary};
use crate::core::stack::BoundedStack;
use crate::events::StackKind;
use crate::subscribers::SubscriberSet;
use crate::tasks::{LocalTask, TaskFn, TaskOutput};

/// Deferred tasks of a single lexical scope.
pub struct ScopeHandler<'a> {
    stack: BoundedStack<LocalTask<'a>>,
    subs: Arc<SubscriberSet>,
}

impl<'a> ScopeHandler<'a> {
    /// Creates an empty scope with the default capacity, logging failures via
    /// the shared [`LogWriter`](crate::LogWriter).
    pub fn new() -> Self {
        Self::with_capacity(SCOPE_CAPACITY)
    }

    /// Creates an empty scope holding at most `capacity` tasks (min 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stack: BoundedStack::new(capacity),
            subs: SubscriberSet::shared_default(),
        }
    }

    /// Replaces the subscribers that observe this scope's failures.
    pub fn with_subscribers(mut self, subs: Arc<SubscriberSet>) -> Self {
        self.subs = subs;
        self
    }

    /// Registers a closure to run when the scope drains.
    pub fn defer<F, R>(&mut self, f: F)
    where
        F: FnOnce() -> R + 'a,
        R: TaskOutput + 'a,
    {
        self.defer_task(Box::new(TaskFn::anonymous(f)));
    }

    /// Registers a named closure to run when the scope drains.
    pub fn defer_named<F, R>(&mut self, name: impl Into<Cow<'static, str>>, f: F)
    where
        F: FnOnce() -> R + 'a,
        R: TaskOutput + 'a,
    {
        self.defer_task(TaskFn::boxed(name, f));
    }

    /// Registers an already-boxed task.
    pub fn defer_task(&mut self, task: LocalTask<'a>) {
        if let Some(evicted) = self.stack.push(task) {
            runner::publish_evicted(
                &self.subs,
                StackKind::Function,
                evicted.name(),
                self.stack.capacity(),
            );
        }
    }

    /// Chaining form of [`ScopeHandler::defer`].
    pub fn task<F, R>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce() -> R + 'a,
        R: TaskOutput + 'a,
    {
        self.defer(f);
        self
    }

    /// Runs every pending task, newest first, and leaves the scope empty.
    ///
    /// The scope stays usable afterwards.
    pub fn execute_all(&mut self) -> DrainSummary {
        self.stack.drain_all(StackKind::Function, &self.subs)
    }

    /// Number of pending tasks.
    #[inline]
    pub fn count(&self) -> usize {
        self.stack.len()
    }

    /// True if no task is pending.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Maximum number of retained tasks.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.stack.capacity()
    }
}

impl Default for ScopeHandler<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScopeHandler<'_> {
    fn drop(&mut self) {
        if !self.stack.is_empty() {
            let _ = self.execute_all();
        }
    }
}

impl std::fmt::Debug for ScopeHandler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeHandler")
            .field("count", &self.stack.len())
            .field("capacity", &self.stack.capacity())
            .finish()
    }
}
