//! # Closure-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: FnOnce() -> R` where `R: TaskOutput`.
//! The closure runs at most once, when the owning stack drains.
//!
//! ## Example
//! ```rust
//! use taskdefer::{Task, TaskFn, TaskRef};
//!
//! let t: TaskRef = TaskFn::boxed("flush-cache", || {
//!     // flush...
//!     Ok::<_, std::io::Error>(())
//! });
//! assert_eq!(t.name(), "flush-cache");
//! ```

use std::borrow::Cow;
use std::fmt;

use crate::error::TaskError;
use crate::tasks::task::{Task, TaskOutput};

/// Closure-backed task implementation.
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new named task.
    ///
    /// Prefer [`TaskFn::boxed`] when you immediately need a [`TaskRef`](crate::TaskRef)
    /// or a [`LocalTask`](crate::LocalTask).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates a task named after the closure's type.
    pub fn anonymous(f: F) -> Self {
        Self::new(std::any::type_name::<F>(), f)
    }

    /// Creates the task and returns it boxed.
    ///
    /// The box coerces to either [`TaskRef`](crate::TaskRef) (when `F: Send + 'static`)
    /// or [`LocalTask`](crate::LocalTask).
    pub fn boxed(name: impl Into<Cow<'static, str>>, f: F) -> Box<Self> {
        Box::new(Self::new(name, f))
    }
}

impl<F> fmt::Debug for TaskFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFn").field("name", &self.name).finish()
    }
}

impl<F, R> Task for TaskFn<F>
where
    F: FnOnce() -> R,
    R: TaskOutput,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(self: Box<Self>) -> Result<(), TaskError> {
        (self.f)().into_task_result()
    }
}
