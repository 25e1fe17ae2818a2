//! Error types used by deferred tasks and process-end hooks.
//!
//! This module defines two error enums:
//!
//! - [`TaskError`] - a deferred task failed while being drained.
//! - [`HookError`] - a process-end observation mechanism could not be attached.
//!
//! Neither type ever escapes a drain or a registration call: they are carried
//! inside [`Event`](crate::Event)s and reported to subscribers instead.
//! Both provide `as_label` / `as_message` helpers for logs.

use thiserror::Error;

/// # Errors produced by deferred task execution.
///
/// A task fails either by returning `Err(..)` or by panicking.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task returned an error value.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task panicked; the panic was caught at the drain boundary.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text (`"<non-string panic>"` if opaque).
        info: String,
    },
}

impl TaskError {
    /// Builds a [`TaskError::Fail`] from anything printable.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use taskdefer::TaskError;
    ///
    /// let err = TaskError::fail("disk full");
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// True if the failure came from a panic rather than a returned error.
    pub fn is_panic(&self) -> bool {
        matches!(self, TaskError::Panicked { .. })
    }
}

/// # Errors produced while attaching a process-end hook.
///
/// Returned by [`ObserveProcessEnd::register`](crate::ObserveProcessEnd::register);
/// the [`CapabilityRegistrar`](crate::CapabilityRegistrar) swallows them and
/// publishes a `HookUnavailable` event.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HookError {
    /// The mechanism does not exist in this host environment.
    #[error("mechanism `{mechanism}` is not supported here")]
    Unsupported {
        /// Capability name of the mechanism.
        mechanism: &'static str,
    },

    /// The host refused the registration.
    #[error("mechanism `{mechanism}` failed to register: {source}")]
    Io {
        /// Capability name of the mechanism.
        mechanism: &'static str,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

impl HookError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HookError::Unsupported { .. } => "hook_unsupported",
            HookError::Io { .. } => "hook_io",
        }
    }

    /// Capability name of the mechanism that failed.
    pub fn mechanism(&self) -> &'static str {
        match self {
            HookError::Unsupported { mechanism } | HookError::Io { mechanism, .. } => mechanism,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(TaskError::fail("x").as_label(), "task_failed");
        assert_eq!(
            TaskError::Panicked { info: "boom".into() }.as_label(),
            "task_panicked"
        );
        assert_eq!(
            HookError::Unsupported { mechanism: "signals" }.as_label(),
            "hook_unsupported"
        );
    }

    #[test]
    fn test_hook_error_reports_mechanism() {
        let err = HookError::Io {
            mechanism: "shutdown_function",
            source: std::io::Error::other("denied"),
        };
        assert_eq!(err.mechanism(), "shutdown_function");
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_panic_flag() {
        assert!(TaskError::Panicked { info: "x".into() }.is_panic());
        assert!(!TaskError::fail("x").is_panic());
    }
}
