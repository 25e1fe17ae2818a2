//! Runtime core: stacks, drains and handlers.
//!
//! - [`stack`]: bounded LIFO storage with oldest-first eviction;
//! - [`runner`]: executes one task with error/panic isolation and event publishing;
//! - [`scope`]: function-scope handler that drains on drop;
//! - [`terminate`]: terminate stack gated by the success oracle;
//! - [`process`]: process-wide handler (global + terminate stacks, hook wiring);
//! - [`builder`]: assembles a [`ProcessHandler`];
//! - [`config`]: capacities and signal settings.

pub(crate) mod builder;
pub(crate) mod config;
pub(crate) mod process;
pub(crate) mod runner;
pub(crate) mod scope;
pub(crate) mod stack;
pub(crate) mod terminate;

pub use builder::ProcessHandlerBuilder;
pub use config::{Config, GLOBAL_CAPACITY, SCOPE_CAPACITY, TERMINATE_CAPACITY};
pub use process::ProcessHandler;
pub use runner::{DrainSummary, run_once};
pub use scope::ScopeHandler;
pub use stack::BoundedStack;
pub use terminate::{EnvironmentInfo, TerminateEntry, TerminateHandler};
