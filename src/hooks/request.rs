//! FastCGI request-end hook.
//!
//! A FastCGI worker serves many requests per process, so "the process ended"
//! is really "this request's response has been flushed". The embedding
//! server reports that moment by calling [`finish_request`] (exposed as
//! [`Defer::finish_request`](crate::Defer::finish_request)); the registered
//! process-end callback then runs terminate and global tasks for the request.

use super::slot::CallbackSlot;
use super::{FASTCGI_FINISH_REQUEST, ObserveProcessEnd, ProcessEndFn, Sapi};
use crate::error::HookError;

static REQUEST_END: CallbackSlot = CallbackSlot::new();

/// Process-end hook driven by FastCGI request completion.
#[derive(Debug, Clone, Copy)]
pub struct RequestEndHook {
    sapi: Sapi,
}

impl RequestEndHook {
    /// Hook for the given execution environment; available only under FastCGI.
    pub fn new(sapi: Sapi) -> Self {
        Self { sapi }
    }
}

impl ObserveProcessEnd for RequestEndHook {
    fn capability(&self) -> &'static str {
        FASTCGI_FINISH_REQUEST
    }

    fn is_available(&self) -> bool {
        self.sapi.is_fastcgi()
    }

    fn methods(&self) -> Vec<&'static str> {
        vec![FASTCGI_FINISH_REQUEST]
    }

    fn register(&self, on_end: ProcessEndFn) -> Result<(), HookError> {
        if !self.is_available() {
            return Err(HookError::Unsupported {
                mechanism: FASTCGI_FINISH_REQUEST,
            });
        }
        REQUEST_END.attach(&on_end);
        Ok(())
    }
}

/// Reports that the current request's response has been sent.
///
/// Runs the process-end sequence of every live handler attached to this hook.
/// Returns `true` if at least one ran.
pub fn finish_request() -> bool {
    REQUEST_END.fire() > 0
}
