//! # Process-wide deferred tasks.
//!
//! [`ProcessHandler`] owns the global stack (capacity 100), the terminate stack
//! and the [`CapabilityRegistrar`] that wires both into the host's process-end
//! mechanisms.
//!
//! ## Process-end sequence
//! ```text
//! mechanism fires (atexit / signal / request end)
//!   └─► execute_process_end()
//!         ├─ execute_terminate()   (gated by the success oracle)
//!         └─ execute_all()         (global stack, LIFO)
//! ```
//!
//! Both drains pop one entry at a time and release the stack lock before running
//! it, so a task may register further tasks on the same handler. Draining an
//! empty handler is a no-op, which makes repeated triggers harmless.
//!
//! The handler is built with [`ProcessHandler::builder`]; most programs use it
//! through the [`Defer`](crate::Defer) facade, which keeps one instance per process.

use std::borrow::Cow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::builder::ProcessHandlerBuilder;
use crate::core::config::Config;
use crate::core::runner::{self, DrainSummary};
use crate::core::scope::ScopeHandler;
use crate::core::stack::BoundedStack;
use crate::core::terminate::{EnvironmentInfo, TerminateHandler};
use crate::events::StackKind;
use crate::hooks::{CapabilityRegistrar, CapabilityReport};
use crate::subscribers::SubscriberSet;
use crate::tasks::{TaskFn, TaskOutput, TaskRef};

/// Process-scope handler: global stack plus terminate stack.
pub struct ProcessHandler {
    cfg: Config,
    global: Mutex<BoundedStack<TaskRef>>,
    terminate: TerminateHandler,
    subs: Arc<SubscriberSet>,
    pub(crate) registrar: CapabilityRegistrar,
}

impl ProcessHandler {
    /// Returns a builder for a handler configured by `cfg`.
    pub fn builder(cfg: Config) -> ProcessHandlerBuilder {
        ProcessHandlerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        subs: Arc<SubscriberSet>,
        terminate: TerminateHandler,
        registrar: CapabilityRegistrar,
    ) -> Self {
        Self {
            global: Mutex::new(BoundedStack::new(cfg.global_capacity_clamped())),
            cfg,
            terminate,
            subs,
            registrar,
        }
    }

    /// Pushes a closure onto the global stack.
    pub fn defer<F, R>(&self, f: F)
    where
        F: FnOnce() -> R + Send + 'static,
        R: TaskOutput + 'static,
    {
        self.defer_task(Box::new(TaskFn::anonymous(f)));
    }

    /// Pushes a named closure onto the global stack.
    pub fn defer_named<F, R>(&self, name: impl Into<Cow<'static, str>>, f: F)
    where
        F: FnOnce() -> R + Send + 'static,
        R: TaskOutput + 'static,
    {
        self.defer_task(TaskFn::boxed(name, f));
    }

    /// Pushes a task onto the global stack, evicting the oldest one when full.
    pub fn defer_task(&self, task: TaskRef) {
        let capacity;
        let evicted = {
            let mut global = self.lock_global();
            capacity = global.capacity();
            global.push(task)
        };
        if let Some(old) = evicted {
            runner::publish_evicted(&self.subs, StackKind::Global, old.name(), capacity);
        }
    }

    /// Registers a terminate callback; see [`TerminateHandler`].
    pub fn terminate<F, R>(&self, f: F, run_always: bool)
    where
        F: FnOnce() -> R + Send + 'static,
        R: TaskOutput + 'static,
    {
        self.terminate
            .add_callback(Box::new(TaskFn::anonymous(f)), run_always);
    }

    /// Registers an already-boxed terminate callback.
    pub fn terminate_task(&self, task: TaskRef, run_always: bool) {
        self.terminate.add_callback(task, run_always);
    }

    /// Drains the global stack, newest first.
    pub fn execute_all(&self) -> DrainSummary {
        let pending = self.global_count();
        runner::drain(StackKind::Global, &self.subs, pending, || {
            self.lock_global().pop()
        })
    }

    /// Drains the terminate stack according to the current outcome.
    pub fn execute_terminate(&self) -> DrainSummary {
        self.terminate.execute_callbacks()
    }

    /// Runs the process-end sequence: terminate stack, then global stack.
    pub fn execute_process_end(&self) -> DrainSummary {
        let terminate = self.execute_terminate();
        terminate.merge(self.execute_all())
    }

    /// Pending tasks on the global stack.
    pub fn global_count(&self) -> usize {
        self.lock_global().len()
    }

    /// Pending entries on the terminate stack.
    pub fn terminate_count(&self) -> usize {
        self.terminate.callback_count()
    }

    /// Creates a fresh scope sharing this handler's subscribers.
    ///
    /// The scope is independent of the process stacks.
    pub fn create_function_defer<'a>(&self) -> ScopeHandler<'a> {
        ScopeHandler::with_capacity(self.cfg.scope_capacity_clamped())
            .with_subscribers(Arc::clone(&self.subs))
    }

    /// Fresh capability probe of the host.
    pub fn signal_handling_info(&self) -> CapabilityReport {
        self.registrar.capabilities()
    }

    /// Whether the host supports the named process-end mechanism.
    pub fn has_capability(&self, name: &str) -> bool {
        self.registrar.has_capability(name)
    }

    /// Diagnostics from the terminate handler.
    pub fn environment_info(&self) -> EnvironmentInfo {
        self.terminate.environment_info()
    }

    /// Configuration the handler was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    fn lock_global(&self) -> MutexGuard<'_, BoundedStack<TaskRef>> {
        self.global.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ProcessHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandler")
            .field("global", &self.global_count())
            .field("terminate", &self.terminate_count())
            .field("registrar", &self.registrar)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::HookError;
    use crate::events::EventKind;
    use crate::hooks::{ObserveProcessEnd, ProcessEndFn, SHUTDOWN_FUNCTION};
    use crate::oracle::FixedStatus;
    use crate::subscribers::Collector;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Mechanism whose trigger the test pulls by hand.
    #[derive(Default)]
    struct Trigger(Mutex<Option<ProcessEndFn>>);

    impl Trigger {
        fn fire(&self) {
            let cb = self.0.lock().unwrap().clone();
            if let Some(cb) = cb {
                cb();
            }
        }
    }

    impl ObserveProcessEnd for Arc<Trigger> {
        fn capability(&self) -> &'static str {
            SHUTDOWN_FUNCTION
        }
        fn is_available(&self) -> bool {
            true
        }
        fn methods(&self) -> Vec<&'static str> {
            vec!["manual"]
        }
        fn register(&self, on_end: ProcessEndFn) -> Result<(), HookError> {
            *self.0.lock().unwrap() = Some(on_end);
            Ok(())
        }
    }

    fn build(status: u16) -> (Arc<ProcessHandler>, Arc<Collector>, Arc<Trigger>) {
        let c = Arc::new(Collector::new());
        let trigger = Arc::new(Trigger::default());
        let handler = ProcessHandler::builder(Config::without_signals())
            .with_subscribers(vec![c.clone()])
            .with_oracle(Arc::new(FixedStatus(status)))
            .with_observers(vec![Box::new(trigger.clone())])
            .build();
        (handler, c, trigger)
    }

    fn record(log: &Log, entry: impl Into<String>) -> impl FnOnce() + Send + 'static {
        let log = Arc::clone(log);
        let entry = entry.into();
        move || log.lock().unwrap().push(entry)
    }

    #[test]
    fn test_global_stack_is_lifo() {
        let (h, _, _) = build(200);
        let log: Log = Arc::default();
        h.defer(record(&log, "first"));
        h.defer(record(&log, "second"));
        h.defer(record(&log, "third"));

        let summary = h.execute_all();

        assert_eq!(*log.lock().unwrap(), ["third", "second", "first"]);
        assert_eq!(summary.ran, 3);
        assert_eq!(h.global_count(), 0);
    }

    #[test]
    fn test_global_stack_keeps_last_hundred() {
        let (h, c, _) = build(200);
        let runs = Arc::new(AtomicUsize::new(0));
        for _ in 0..150 {
            let runs = Arc::clone(&runs);
            h.defer(move || {
                runs.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(h.global_count(), 100);
        assert_eq!(c.of_kind(EventKind::TaskEvicted).len(), 50);

        h.execute_all();
        assert_eq!(runs.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_eviction_keeps_most_recent() {
        let (h, _, _) = build(200);
        let log: Log = Arc::default();
        for i in 0..120 {
            h.defer(record(&log, i.to_string()));
        }
        h.execute_all();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 100);
        assert_eq!(log.first().map(String::as_str), Some("119"));
        assert_eq!(log.last().map(String::as_str), Some("20"));
    }

    #[test]
    fn test_failures_are_isolated_and_reported() {
        let (h, c, _) = build(200);
        let log: Log = Arc::default();
        h.defer(record(&log, "cleanup1"));
        h.defer_named("throws", || Err::<(), _>("Test exception"));
        h.defer(record(&log, "cleanup3"));

        let summary = h.execute_all();

        assert_eq!(*log.lock().unwrap(), ["cleanup3", "cleanup1"]);
        assert_eq!(summary.failed, 1);
        let failed = c.of_kind(EventKind::TaskFailed);
        assert_eq!(failed[0].task.as_deref(), Some("throws"));
        assert_eq!(failed[0].reason.as_deref(), Some("error: Test exception"));
    }

    #[test]
    fn test_terminate_delegates() {
        let (h, _, _) = build(200);
        let log: Log = Arc::default();
        h.terminate(record(&log, "normal"), false);
        h.terminate(record(&log, "always"), true);
        assert_eq!(h.terminate_count(), 2);

        h.execute_terminate();

        assert_eq!(*log.lock().unwrap(), ["normal", "always"]);
        assert_eq!(h.terminate_count(), 0);
    }

    #[test]
    fn test_process_end_runs_terminate_before_global() {
        let (h, c, trigger) = build(500);
        let log: Log = Arc::default();
        h.defer(record(&log, "global"));
        h.terminate(record(&log, "skipped"), false);
        h.terminate(record(&log, "always"), true);

        trigger.fire();

        assert_eq!(*log.lock().unwrap(), ["always", "global"]);
        assert_eq!(c.of_kind(EventKind::ProcessEndTriggered).len(), 1);

        // a second trigger finds nothing left to do
        trigger.fire();
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_dropped_handler_ignores_trigger() {
        let (h, _, trigger) = build(200);
        let log: Log = Arc::default();
        h.defer(record(&log, "never"));
        drop(h);

        trigger.fire();

        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_tasks_may_register_more_tasks() {
        let (h, _, _) = build(200);
        let log: Log = Arc::default();
        let inner = Arc::clone(&h);
        let late = record(&log, "late");
        h.defer(record(&log, "outer-first"));
        h.defer(move || inner.defer(late));

        h.execute_all();

        assert_eq!(*log.lock().unwrap(), ["late", "outer-first"]);
        assert_eq!(h.global_count(), 0);
    }

    #[test]
    fn test_function_defer_is_independent() {
        let (h, _, _) = build(200);
        let log: Log = Arc::default();
        h.defer(record(&log, "global"));
        {
            let mut scope = h.create_function_defer();
            scope.defer(record(&log, "scoped"));
            assert_eq!(scope.count(), 1);
            assert_eq!(scope.capacity(), 50);
        }
        assert_eq!(*log.lock().unwrap(), ["scoped"]);
        assert_eq!(h.global_count(), 1);
        h.execute_all();
    }

    #[test]
    fn test_builder_adds_subscribers() {
        let first = Arc::new(Collector::new());
        let second = Arc::new(Collector::new());
        let h = ProcessHandler::builder(Config::without_signals())
            .with_subscribers(Vec::new())
            .add_subscriber(first.clone())
            .add_subscriber(second.clone())
            .with_observers(Vec::new())
            .build();

        h.defer_named("throws", || Err::<(), _>("boom"));
        h.execute_all();

        assert_eq!(first.of_kind(EventKind::TaskFailed).len(), 1);
        assert_eq!(second.of_kind(EventKind::TaskFailed).len(), 1);
    }

    #[test]
    fn test_diagnostics() {
        let (h, c, _) = build(200);
        assert_eq!(c.of_kind(EventKind::HookRegistered).len(), 1);

        let report = h.signal_handling_info();
        assert!(report.has(SHUTDOWN_FUNCTION));
        assert_eq!(report.methods, vec!["manual"]);
        assert!(h.has_capability("shutdown_function"));
        assert!(!h.has_capability("nonexistent_capability"));

        assert_eq!(h.environment_info().current_response_code, Some(200));
        assert_eq!(h.config(), &Config::without_signals());
    }
}
