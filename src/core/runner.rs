//! # Run deferred tasks with fault isolation.
//!
//! - [`run_once`] executes a single task, catching both returned errors and panics,
//!   and publishes `TaskFailed` on failure.
//! - [`drain`] repeatedly pulls the next entry from a source and runs it until
//!   the source is empty.
//!
//! ## Event flow
//!
//! ```text
//! drain(kind, pending > 0):
//!   publish DrainStarted{count = pending}
//!   loop next() ─► Some(task) ─► run_once(task)
//!                                 ├─ Ok            ─► continue
//!                                 ├─ Err(Fail)     ─► publish TaskFailed, continue
//!                                 └─ panic         ─► publish TaskFailed, continue
//!              └► None ─► publish DrainFinished{count = failed}
//! ```
//!
//! ## Rules
//! - A failure never interrupts the loop and never reaches the caller.
//! - `next` is called once per entry; callers holding a lock must release it
//!   before returning the task, so tasks may register new tasks re-entrantly.
//! - With `pending == 0` and an empty source nothing is published.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::error::TaskError;
use crate::events::{Event, EventKind, StackKind};
use crate::subscribers::SubscriberSet;
use crate::tasks::Task;

/// Outcome counters of one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// Tasks that were invoked (successfully or not).
    pub ran: usize,
    /// Invoked tasks that returned an error or panicked.
    pub failed: usize,
    /// Terminate entries discarded unexecuted.
    pub skipped: usize,
}

impl DrainSummary {
    /// True if nothing ran and nothing was skipped.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ran == 0 && self.skipped == 0
    }

    /// Sums the counters of two drains.
    #[must_use]
    pub fn merge(self, other: DrainSummary) -> DrainSummary {
        DrainSummary {
            ran: self.ran + other.ran,
            failed: self.failed + other.failed,
            skipped: self.skipped + other.skipped,
        }
    }
}

/// Executes one task, publishing `TaskFailed` to `subs` if it fails.
pub fn run_once<T: Task + ?Sized>(
    task: Box<T>,
    kind: StackKind,
    subs: &SubscriberSet,
) -> Result<(), TaskError> {
    let name: Arc<str> = Arc::from(task.name());

    let res = match catch_unwind(AssertUnwindSafe(move || task.run())) {
        Ok(r) => r,
        Err(payload) => Err(TaskError::Panicked {
            info: panic_message(payload.as_ref()),
        }),
    };

    if let Err(e) = &res {
        publish_failed(subs, kind, name, e);
    }
    res
}

/// Runs every task yielded by `next` until it returns `None`.
pub fn drain<T, F>(kind: StackKind, subs: &SubscriberSet, pending: usize, mut next: F) -> DrainSummary
where
    T: Task + ?Sized,
    F: FnMut() -> Option<Box<T>>,
{
    let mut summary = DrainSummary::default();
    let mut started = false;

    while let Some(task) = next() {
        if !started {
            publish_started(subs, kind, pending.max(1));
            started = true;
        }
        summary.ran += 1;
        if run_once(task, kind, subs).is_err() {
            summary.failed += 1;
        }
    }

    if started {
        publish_finished(subs, kind, summary.failed);
    }
    summary
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic>".to_string()
    }
}

pub(crate) fn publish_started(subs: &SubscriberSet, kind: StackKind, pending: usize) {
    subs.emit(
        &Event::new(EventKind::DrainStarted)
            .with_stack(kind)
            .with_count(pending),
    );
}

pub(crate) fn publish_finished(subs: &SubscriberSet, kind: StackKind, failed: usize) {
    subs.emit(
        &Event::new(EventKind::DrainFinished)
            .with_stack(kind)
            .with_count(failed),
    );
}

/// Publishes `TaskEvicted` for an entry dropped on overflow.
pub(crate) fn publish_evicted(subs: &SubscriberSet, kind: StackKind, task: &str, capacity: usize) {
    subs.emit(
        &Event::new(EventKind::TaskEvicted)
            .with_stack(kind)
            .with_task(task)
            .with_count(capacity),
    );
}

fn publish_failed(subs: &SubscriberSet, kind: StackKind, task: Arc<str>, err: &TaskError) {
    subs.emit(
        &Event::new(EventKind::TaskFailed)
            .with_stack(kind)
            .with_task(task)
            .with_reason(err.as_message()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscribers::Collector;
    use crate::tasks::{TaskFn, TaskRef};

    fn collecting() -> (Arc<Collector>, SubscriberSet) {
        let c = Arc::new(Collector::new());
        let set = SubscriberSet::new(vec![c.clone()]);
        (c, set)
    }

    fn panics_with_string() {
        panic!("{} went wrong", "something");
    }

    #[test]
    fn test_run_once_ok() {
        let (c, subs) = collecting();
        let t: TaskRef = TaskFn::boxed("ok", || {});
        assert!(run_once(t, StackKind::Global, &subs).is_ok());
        assert!(c.events().is_empty());
    }

    #[test]
    fn test_run_once_reports_error() {
        let (c, subs) = collecting();
        let t: TaskRef = TaskFn::boxed("db", || Err::<(), _>("connection reset"));

        let err = run_once(t, StackKind::Global, &subs).unwrap_err();

        assert_eq!(err, TaskError::fail("connection reset"));
        let ev = &c.events()[0];
        assert_eq!(ev.kind, EventKind::TaskFailed);
        assert_eq!(ev.stack, Some(StackKind::Global));
        assert_eq!(ev.task.as_deref(), Some("db"));
        assert_eq!(ev.reason.as_deref(), Some("error: connection reset"));
    }

    #[test]
    fn test_run_once_catches_panic() {
        let (c, subs) = collecting();
        let t: TaskRef = TaskFn::boxed("panicky", panics_with_string);

        let err = run_once(t, StackKind::Terminate, &subs).unwrap_err();

        assert_eq!(
            err,
            TaskError::Panicked {
                info: "something went wrong".into()
            }
        );
        assert_eq!(c.kinds(), vec![EventKind::TaskFailed]);
    }

    #[test]
    fn test_drain_publishes_lifecycle() {
        let (c, subs) = collecting();
        let mut tasks: Vec<TaskRef> = vec![TaskFn::boxed("a", || {}), TaskFn::boxed("b", || {})];

        let summary = drain(StackKind::Global, &subs, 2, || tasks.pop());

        assert_eq!(summary.ran, 2);
        assert_eq!(
            c.kinds(),
            vec![EventKind::DrainStarted, EventKind::DrainFinished]
        );
        assert_eq!(c.events()[0].count, Some(2));
    }

    #[test]
    fn test_panic_message_variants() {
        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "<non-string panic>");
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
    }
}
