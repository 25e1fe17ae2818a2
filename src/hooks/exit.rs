//! `atexit`-based process-end hook.
//!
//! Runs on normal exit: returning from `main` and `std::process::exit`
//! (including the exit performed by the signal hook). It is the one mechanism
//! assumed to exist everywhere, so it backs the `shutdown_function` capability.
//!
//! The C runtime keeps at most a fixed number of `atexit` entries and offers no
//! way to remove one, so the trampoline is installed once per process and runs
//! every live callback in a shared [`CallbackSlot`]. Each live handler gets its
//! process-end sequence run.

use std::sync::atomic::{AtomicBool, Ordering};

use super::slot::CallbackSlot;
use super::{ObserveProcessEnd, ProcessEndFn, SHUTDOWN_FUNCTION};
use crate::error::HookError;

static INSTALLED: AtomicBool = AtomicBool::new(false);
static CALLBACKS: CallbackSlot = CallbackSlot::new();

/// Process-end hook backed by the C runtime's `atexit`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExitHook;

impl ObserveProcessEnd for ExitHook {
    fn capability(&self) -> &'static str {
        SHUTDOWN_FUNCTION
    }

    fn is_available(&self) -> bool {
        true
    }

    fn methods(&self) -> Vec<&'static str> {
        vec!["atexit"]
    }

    fn register(&self, on_end: ProcessEndFn) -> Result<(), HookError> {
        if !INSTALLED.swap(true, Ordering::SeqCst) {
            // SAFETY: `run_at_exit` is a plain `extern "C" fn()` without captured state
            // and never unwinds across the FFI boundary.
            let rc = unsafe { libc::atexit(run_at_exit) };
            if rc != 0 {
                INSTALLED.store(false, Ordering::SeqCst);
                return Err(HookError::Io {
                    mechanism: SHUTDOWN_FUNCTION,
                    source: std::io::Error::last_os_error(),
                });
            }
        }
        CALLBACKS.attach(&on_end);
        Ok(())
    }
}

/// Called by the C runtime on process exit.
extern "C" fn run_at_exit() {
    CALLBACKS.fire();
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_registrations_accumulate() {
        let first: ProcessEndFn = Arc::new(|| {});
        let second: ProcessEndFn = Arc::new(|| {});

        assert!(ExitHook.register(Arc::clone(&first)).is_ok());
        assert!(ExitHook.register(Arc::clone(&second)).is_ok());
        assert!(INSTALLED.load(Ordering::SeqCst));
        assert!(CALLBACKS.live() >= 2);

        drop(first);
        drop(second);
    }

    #[test]
    fn test_always_available() {
        assert!(ExitHook.is_available());
        assert_eq!(ExitHook.capability(), "shutdown_function");
    }
}
