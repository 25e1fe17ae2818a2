//! # Example: scoped_cleanup
//!
//! Function-scope cleanup with a custom subscriber.
//!
//! Shows how to:
//! - Register cleanup tasks on a [`ScopeHandler`] that borrow local state.
//! - Let the scope drain on drop, also when the body fails.
//! - Observe task failures through a [`Subscribe`] implementation.
//!
//! ## Flow
//! ```text
//! copy_file()
//!   ├─► scope.task(close source)
//!   ├─► scope.task(close target)
//!   ├─► scope.task(remove partial file)   (fails: nothing to remove)
//!   └─► return ──► drop(scope) ──► remove partial, close target, close source
//!                                    └─► TaskFailed ──► ConsoleSubscriber
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example scoped_cleanup
//! ```

use std::cell::RefCell;
use std::sync::Arc;

use taskdefer::{Event, EventKind, ScopeHandler, Subscribe, SubscriberSet};

/// Prints failures and evictions.
struct ConsoleSubscriber;

impl Subscribe for ConsoleSubscriber {
    fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::TaskFailed => println!(
                "[sub] failed:  task={} reason={}",
                ev.task.as_deref().unwrap_or("<unknown>"),
                ev.reason.as_deref().unwrap_or("<none>")
            ),
            EventKind::TaskEvicted => println!(
                "[sub] evicted: task={}",
                ev.task.as_deref().unwrap_or("<unknown>")
            ),
            _ => {}
        }
    }
}

fn copy_file(log: &RefCell<Vec<String>>, subs: &Arc<SubscriberSet>) {
    let mut scope = ScopeHandler::new().with_subscribers(Arc::clone(subs));

    log.borrow_mut().push("open source".into());
    scope.defer_named("close-source", || log.borrow_mut().push("close source".into()));

    log.borrow_mut().push("open target".into());
    scope.defer_named("close-target", || log.borrow_mut().push("close target".into()));

    scope.defer_named("remove-partial", || {
        std::fs::remove_file("/nonexistent/partial.tmp")
    });

    log.borrow_mut().push("copy bytes".into());
}

fn main() {
    let subs = Arc::new(SubscriberSet::new(vec![Arc::new(ConsoleSubscriber)]));
    let log = RefCell::new(Vec::new());

    copy_file(&log, &subs);

    for line in log.borrow().iter() {
        println!("{line}");
    }
}
