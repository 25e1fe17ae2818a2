//! # Terminate stack gated by the process outcome.
//!
//! [`TerminateHandler`] holds up to 50 [`TerminateEntry`]s. When executed it asks
//! the [`SuccessOracle`] **once** for the outcome and then drains every entry in
//! registration order:
//!
//! ```text
//! outcome = oracle.outcome()
//! for entry in entries (oldest first):
//!     Success            ─► run
//!     Failure, always    ─► run
//!     Failure, !always   ─► discard, publish TaskSkipped
//! ```
//!
//! Failures of individual entries are isolated exactly like any other drain.
//! Entries added while executing are picked up by the same pass.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::core::config::TERMINATE_CAPACITY;
use crate::core::runner::{self, DrainSummary};
use crate::core::stack::BoundedStack;
use crate::events::{Event, EventKind, StackKind};
use crate::hooks::env::Sapi;
use crate::oracle::{Outcome, ResponseStatus, SuccessOracle};
use crate::subscribers::SubscriberSet;
use crate::tasks::TaskRef;

/// A terminate task plus its gating flag.
pub struct TerminateEntry {
    /// Task to run.
    pub task: TaskRef,
    /// Run even when the outcome is a failure.
    pub run_always: bool,
}

impl TerminateEntry {
    /// Wraps `task`; `run_always` entries also run on failure outcomes.
    pub fn new(task: TaskRef, run_always: bool) -> Self {
        Self { task, run_always }
    }
}

impl std::fmt::Debug for TerminateEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminateEntry")
            .field("task", &self.task.name())
            .field("run_always", &self.run_always)
            .finish()
    }
}

/// Read-only diagnostics about the termination environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentInfo {
    /// Execution-environment identifier (`cli`, `cgi`, `fastcgi`).
    pub sapi: &'static str,
    /// Running under FastCGI.
    pub fastcgi: bool,
    /// The environment supports flushing the response and continuing
    /// (request-end callbacks are available).
    pub fastcgi_finish_request: bool,
    /// Buffering mode of standard output.
    pub output_buffering: &'static str,
    /// Status the success oracle reports right now.
    pub current_response_code: Option<u16>,
}

/// Terminate-scope handler.
pub struct TerminateHandler {
    entries: Mutex<BoundedStack<TerminateEntry>>,
    oracle: Arc<dyn SuccessOracle>,
    subs: Arc<SubscriberSet>,
    sapi: Sapi,
}

impl TerminateHandler {
    /// Creates a handler with default capacity, the process-wide
    /// [`ResponseStatus`] oracle and the default subscribers.
    pub fn new() -> Self {
        Self::with_parts(
            TERMINATE_CAPACITY,
            Arc::new(ResponseStatus),
            SubscriberSet::shared_default(),
        )
    }

    /// Creates a handler from explicit parts.
    pub fn with_parts(
        capacity: usize,
        oracle: Arc<dyn SuccessOracle>,
        subs: Arc<SubscriberSet>,
    ) -> Self {
        Self {
            entries: Mutex::new(BoundedStack::new(capacity)),
            oracle,
            subs,
            sapi: Sapi::detect(),
        }
    }

    /// Replaces the success oracle.
    pub fn with_oracle(mut self, oracle: Arc<dyn SuccessOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    /// Adds a callback; `run_always` callbacks also run on failure outcomes.
    pub fn add_callback(&self, task: TaskRef, run_always: bool) {
        let capacity;
        let evicted = {
            let mut entries = self.lock();
            capacity = entries.capacity();
            entries.push(TerminateEntry::new(task, run_always))
        };
        if let Some(old) = evicted {
            runner::publish_evicted(&self.subs, StackKind::Terminate, old.task.name(), capacity);
        }
    }

    /// Number of pending callbacks.
    pub fn callback_count(&self) -> usize {
        self.lock().len()
    }

    /// Runs (or discards) every pending callback according to the oracle's outcome.
    pub fn execute_callbacks(&self) -> DrainSummary {
        let pending = self.callback_count();
        if pending == 0 {
            return DrainSummary::default();
        }

        let status = self.oracle.status();
        let success = Outcome::classify(status).is_success();
        runner::publish_started(&self.subs, StackKind::Terminate, pending);

        let mut summary = DrainSummary::default();
        while let Some(entry) = self.next_entry() {
            if success || entry.run_always {
                summary.ran += 1;
                if runner::run_once(entry.task, StackKind::Terminate, &self.subs).is_err() {
                    summary.failed += 1;
                }
            } else {
                summary.skipped += 1;
                self.publish_skipped(entry.task.name(), status);
            }
        }

        runner::publish_finished(&self.subs, StackKind::Terminate, summary.failed);
        summary
    }

    /// Read-only facts about the termination environment.
    pub fn environment_info(&self) -> EnvironmentInfo {
        EnvironmentInfo {
            sapi: self.sapi.as_str(),
            fastcgi: self.sapi.is_fastcgi(),
            fastcgi_finish_request: self.sapi.is_fastcgi(),
            output_buffering: "line",
            current_response_code: self.oracle.status(),
        }
    }

    /// Pops the oldest entry, releasing the lock before it runs.
    fn next_entry(&self) -> Option<TerminateEntry> {
        self.lock().pop_oldest()
    }

    fn publish_skipped(&self, task: &str, status: Option<u16>) {
        let mut ev = Event::new(EventKind::TaskSkipped)
            .with_stack(StackKind::Terminate)
            .with_task(task);
        if let Some(code) = status {
            ev = ev.with_status(code);
        }
        self.subs.emit(&ev);
    }

    fn lock(&self) -> MutexGuard<'_, BoundedStack<TerminateEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TerminateHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TerminateHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminateHandler")
            .field("count", &self.callback_count())
            .field("sapi", &self.sapi)
            .finish()
    }
}
