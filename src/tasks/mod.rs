//! # Task abstractions.
//!
//! This module provides the deferred-task types:
//! - [`Task`] - trait for a run-once, fallible unit of cleanup work
//! - [`TaskFn`] - closure-backed task implementation
//! - [`TaskOutput`] - what a task closure may return (`()` or `Result<(), E>`)
//! - [`TaskRef`] - owned, sendable task (`Box<dyn Task + Send>`) for process scope
//! - [`LocalTask`] - owned task that may borrow from the enclosing frame

mod task;
mod task_fn;

pub use task::{LocalTask, Task, TaskOutput, TaskRef};
pub use task_fn::TaskFn;
