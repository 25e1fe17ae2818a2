//! # taskdefer
//!
//! **Taskdefer** runs cleanup work that must not be forgotten: tasks are
//! registered now and executed later, newest first, when their scope ends.
//!
//! Three scopes exist:
//! - a **function scope** ([`ScopeHandler`]) drained when the handler is dropped,
//!   including during unwinding;
//! - the **global stack** of the process ([`ProcessHandler`]) drained at process end;
//! - the **terminate stack** ([`TerminateHandler`]) drained at process end before
//!   the global stack, gated by the success of the run.
//!
//! A failing task (error or panic) is reported to the subscribers and never
//! stops the remaining tasks.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ScopeHandler (per frame)        ProcessHandler (one per process via Defer)
//!   ┌──────────────────────┐        ┌──────────────────────────────────────────┐
//!   │ BoundedStack (50)    │        │ global:    BoundedStack (100)            │
//!   │ drains on drop       │        │ terminate: TerminateHandler (50)         │
//!   └──────────┬───────────┘        │              └─ SuccessOracle            │
//!              │                    │ registrar: CapabilityRegistrar           │
//!              │                    │              ├─ ExitHook     (atexit)    │
//!              │                    │              ├─ SignalHook   (signals)   │
//!              │                    │              └─ RequestEndHook (FastCGI) │
//!              │                    └──────────────────┬───────────────────────┘
//!              │  TaskFailed / TaskEvicted / ...       │
//!              ▼                                       ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │               SubscriberSet (synchronous fan-out)                 │
//! └──────────────┬───────────────────────────────┬────────────────────┘
//!                ▼                               ▼
//!            LogWriter (tracing)            user subscribers
//! ```
//!
//! ### Lifecycle
//! ```text
//! register task ──► BoundedStack::push (evicts oldest when full)
//!
//! drain:
//!   while let Some(task) = pop():        (lock released before running)
//!     ├─ Ok          ─► continue
//!     ├─ Err / panic ─► publish TaskFailed, continue
//!
//! process end (first of: atexit, SIGINT/SIGTERM/SIGQUIT/SIGHUP, request end):
//!   execute_terminate()  ─► success: run all   | failure: run only `run_always`
//!   execute_all()        ─► global stack, newest first
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                         |
//! |-------------------|-----------------------------------------------------------|--------------------------------------------|
//! | **Scopes**        | Function-scope cleanup, drained on drop.                  | [`ScopeHandler`], [`Defer::scope`]         |
//! | **Process**       | Global and terminate stacks run at process end.           | [`ProcessHandler`], [`Defer`]              |
//! | **Gating**        | Success/failure classification of the run.                | [`SuccessOracle`], [`ResponseStatus`]      |
//! | **Hooks**         | Host mechanisms that observe process end.                 | [`ObserveProcessEnd`], [`CapabilityReport`]|
//! | **Subscriber API**| Observe failures, evictions, skips and hook registration. | [`Subscribe`], [`LogWriter`]               |
//! | **Errors**        | Typed task and hook errors.                               | [`TaskError`], [`HookError`]               |
//! | **Configuration** | Capacities and signal handling.                           | [`Config`]                                 |
//!
//! ## Optional features
//! - `signals` _(default)_: watch termination signals on a background thread (tokio).
//!
//! ## Example
//! ```rust
//! use taskdefer::{Config, Defer, ResponseStatus};
//!
//! Defer::configure(Config::without_signals());
//!
//! Defer::global(|| println!("close connection pool"));
//! Defer::terminate(|| println!("send report"), false);
//! Defer::terminate(|| println!("remove lock file"), true);
//!
//! {
//!     let mut scope = Defer::scope();
//!     scope
//!         .task(|| println!("close temp file"))
//!         .task(|| std::fs::remove_file("/nonexistent/tmp"));
//!     // dropped here: the failing removal is logged, the other task still runs
//! }
//!
//! ResponseStatus::set(500);
//! Defer::handler().execute_process_end(); // "remove lock file", "close connection pool"
//! ResponseStatus::clear();
//! Defer::reset();
//! ```
mod core;
mod error;
mod events;
mod facade;
mod hooks;
mod oracle;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{
    BoundedStack, Config, DrainSummary, EnvironmentInfo, GLOBAL_CAPACITY, ProcessHandler,
    ProcessHandlerBuilder, SCOPE_CAPACITY, ScopeHandler, TERMINATE_CAPACITY, TerminateEntry,
    TerminateHandler, run_once,
};
pub use error::{HookError, TaskError};
pub use events::{Event, EventKind, StackKind};
pub use facade::Defer;
pub use hooks::{
    CapabilityRegistrar, CapabilityReport, ExitHook, FASTCGI_FINISH_REQUEST, ObserveProcessEnd,
    ProcessEndFn, RequestEndHook, SHUTDOWN_FUNCTION, SIGNALS, Sapi,
};
pub use oracle::{FAILURE_THRESHOLD, FixedStatus, Outcome, ResponseStatus, SuccessOracle};
pub use subscribers::{Collector, LogWriter, Subscribe, SubscriberSet};
pub use tasks::{LocalTask, Task, TaskFn, TaskOutput, TaskRef};

// Enable with: `--features signals` (on by default)
#[cfg(feature = "signals")]
pub use hooks::SignalHook;
