//! # Events emitted by deferred-task handlers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Task events**: a deferred task failed, was skipped or was evicted
//! - **Drain events**: a stack started or finished draining
//! - **Hook events**: process-end mechanisms were attached, or not
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task name,
//! the originating stack and failure reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use taskdefer::{Event, EventKind, StackKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_stack(StackKind::Global)
//!     .with_task("close-db")
//!     .with_reason("connection reset");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("close-db"));
//! assert_eq!(ev.reason.as_deref(), Some("connection reset"));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task events ===
    /// A task returned an error or panicked during a drain.
    ///
    /// Sets:
    /// - `stack`: originating stack
    /// - `task`: task name
    /// - `reason`: failure message
    TaskFailed,

    /// A terminate entry was discarded unexecuted because the outcome was a failure.
    ///
    /// Sets:
    /// - `stack`: always `Terminate`
    /// - `task`: task name
    /// - `status`: response status that classified the outcome
    TaskSkipped,

    /// Oldest entry dropped because the stack was at capacity.
    ///
    /// Sets:
    /// - `stack`: originating stack
    /// - `task`: evicted task name
    /// - `count`: stack capacity
    TaskEvicted,

    // === Drain events ===
    /// A non-empty stack started draining.
    ///
    /// Sets:
    /// - `stack`: originating stack
    /// - `count`: number of entries about to run
    DrainStarted,

    /// A drain finished.
    ///
    /// Sets:
    /// - `stack`: originating stack
    /// - `count`: number of entries that failed
    DrainFinished,

    // === Hook events ===
    /// A process-end mechanism was attached.
    ///
    /// Sets:
    /// - `mechanism`: capability name
    HookRegistered,

    /// A process-end mechanism was skipped (unsupported or refused).
    ///
    /// Sets:
    /// - `mechanism`: capability name
    /// - `reason`: why it was skipped
    HookUnavailable,

    /// The process-end sequence was triggered by a hook.
    ///
    /// Sets:
    /// - `mechanism`: capability name of the trigger
    ProcessEndTriggered,
}

/// Which stack an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackKind {
    /// A function-scope stack ([`ScopeHandler`](crate::ScopeHandler)).
    Function,
    /// The process-wide global stack.
    Global,
    /// The process-wide terminate stack.
    Terminate,
}

impl StackKind {
    /// Stable lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            StackKind::Function => "function",
            StackKind::Global => "global",
            StackKind::Terminate => "terminate",
        }
    }
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Originating stack, if applicable.
    pub stack: Option<StackKind>,
    /// Name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (errors, skip details, etc.).
    pub reason: Option<Arc<str>>,
    /// Capability name of a process-end mechanism.
    pub mechanism: Option<&'static str>,
    /// Entry count (meaning depends on kind).
    pub count: Option<usize>,
    /// Response status consulted by the success oracle.
    pub status: Option<u16>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            stack: None,
            task: None,
            reason: None,
            mechanism: None,
            count: None,
            status: None,
        }
    }

    /// Attaches the originating stack.
    #[inline]
    pub fn with_stack(mut self, stack: StackKind) -> Self {
        self.stack = Some(stack);
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a mechanism name.
    #[inline]
    pub fn with_mechanism(mut self, mechanism: &'static str) -> Self {
        self.mechanism = Some(mechanism);
        self
    }

    /// Attaches an entry count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n);
        self
    }

    /// Attaches a response status.
    #[inline]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self.kind, EventKind::TaskFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::DrainStarted);
        let b = Event::new(EventKind::DrainFinished);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builder_sets_fields() {
        let ev = Event::new(EventKind::TaskSkipped)
            .with_stack(StackKind::Terminate)
            .with_task("notify")
            .with_status(500);
        assert_eq!(ev.stack, Some(StackKind::Terminate));
        assert_eq!(ev.status, Some(500));
        assert!(!ev.is_failure());
    }
}
