//! # Task abstraction.
//!
//! A deferred task is consumed by running it: [`Task::run`] takes `self: Box<Self>`,
//! so a task popped from a stack can never be executed twice.
//!
//! Two owned handle types are used across the crate:
//! - [`TaskRef`] for process-wide stacks, which may be drained from another thread
//!   (signal watcher, `atexit`), so tasks must be `Send + 'static`;
//! - [`LocalTask`] for function scopes, which never leave the creating frame and
//!   may therefore borrow locals.

use crate::error::TaskError;

/// # Run-once unit of deferred work.
///
/// # Example
/// ```
/// use taskdefer::{Task, TaskError};
///
/// struct CloseFile;
///
/// impl Task for CloseFile {
///     fn name(&self) -> &str { "close-file" }
///
///     fn run(self: Box<Self>) -> Result<(), TaskError> {
///         // release the handle...
///         Ok(())
///     }
/// }
/// ```
pub trait Task {
    /// Returns a human-readable task name (used in failure events).
    fn name(&self) -> &str;

    /// Executes the task, consuming it.
    ///
    /// Returning `Err` or panicking both count as a task failure; the drain
    /// that invoked the task reports it and moves on.
    fn run(self: Box<Self>) -> Result<(), TaskError>;
}

/// Owned task that may be drained from any thread.
pub type TaskRef = Box<dyn Task + Send + 'static>;

/// Owned task bound to the lifetime of the scope that created it.
pub type LocalTask<'a> = Box<dyn Task + 'a>;

/// Return types accepted from task closures.
///
/// - `()` always counts as success;
/// - `Result<(), E>` counts as failure on `Err`, with `E` rendered via `Display`.
pub trait TaskOutput {
    /// Converts the closure's return value into the task outcome.
    fn into_task_result(self) -> Result<(), TaskError>;
}

impl TaskOutput for () {
    #[inline]
    fn into_task_result(self) -> Result<(), TaskError> {
        Ok(())
    }
}

impl<E: std::fmt::Display> TaskOutput for Result<(), E> {
    #[inline]
    fn into_task_result(self) -> Result<(), TaskError> {
        self.map_err(TaskError::fail)
    }
}
