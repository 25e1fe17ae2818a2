//! # LogWriter: forwards events to `tracing`
//!
//! Installed by default on every handler so that task failures are always
//! logged. Failures, skips and evictions are emitted at `warn`, lifecycle
//! events at `debug`. Install a `tracing` subscriber in the host binary to see them.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! WARN taskdefer: deferred task failed stack=global task="close-db" reason="error: reset"
//! WARN taskdefer: terminate task skipped stack=terminate task="notify" status=500
//! DEBUG taskdefer: drain started stack=function count=3
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default, Debug)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Subscribe for LogWriter {
    fn on_event(&self, e: &Event) {
        let stack = e.stack.map(|s| s.as_str()).unwrap_or("-");
        let task = e.task.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::TaskFailed => {
                tracing::warn!(
                    target: "taskdefer",
                    stack,
                    task,
                    reason = e.reason.as_deref().unwrap_or("unknown"),
                    "deferred task failed"
                );
            }
            EventKind::TaskSkipped => {
                tracing::warn!(
                    target: "taskdefer",
                    stack,
                    task,
                    status = e.status,
                    "terminate task skipped"
                );
            }
            EventKind::TaskEvicted => {
                tracing::warn!(
                    target: "taskdefer",
                    stack,
                    task,
                    capacity = e.count,
                    "oldest deferred task evicted"
                );
            }
            EventKind::DrainStarted => {
                tracing::debug!(target: "taskdefer", stack, count = e.count, "drain started");
            }
            EventKind::DrainFinished => {
                tracing::debug!(target: "taskdefer", stack, failed = e.count, "drain finished");
            }
            EventKind::HookRegistered => {
                tracing::debug!(target: "taskdefer", mechanism = e.mechanism, "process-end hook registered");
            }
            EventKind::HookUnavailable => {
                tracing::debug!(
                    target: "taskdefer",
                    mechanism = e.mechanism,
                    reason = e.reason.as_deref(),
                    "process-end hook unavailable"
                );
            }
            EventKind::ProcessEndTriggered => {
                tracing::debug!(target: "taskdefer", mechanism = e.mechanism, "process end triggered");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
