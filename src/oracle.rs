//! # Success oracle.
//!
//! The terminate stack is gated on the outcome of the process (or request):
//! a response-status-like code below 400, or no code at all, is a success;
//! 400 and above is a failure.
//!
//! - [`SuccessOracle`] the trait consulted by [`TerminateHandler`](crate::TerminateHandler)
//! - [`ResponseStatus`] process-wide status slot the application writes to
//! - [`FixedStatus`] constant oracle (tests, one-shot tools)
//!
//! ## Example
//! ```rust
//! use taskdefer::{Outcome, ResponseStatus, SuccessOracle};
//!
//! ResponseStatus::set(503);
//! assert_eq!(ResponseStatus.outcome(), Outcome::Failure);
//! ResponseStatus::clear();
//! assert_eq!(ResponseStatus.outcome(), Outcome::Success);
//! ```

use std::sync::atomic::{AtomicU16, Ordering};

/// First status code classified as a failure.
pub const FAILURE_THRESHOLD: u16 = 400;

/// Process-wide current status; `0` means "not known yet".
static CURRENT_STATUS: AtomicU16 = AtomicU16::new(0);

/// Success/failure classification of a finished process or request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Classifies a status code; `None` (unknown) is a success.
    #[inline]
    pub fn classify(status: Option<u16>) -> Self {
        match status {
            Some(code) if code >= FAILURE_THRESHOLD => Outcome::Failure,
            _ => Outcome::Success,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Supplies the status used to gate terminate callbacks.
pub trait SuccessOracle: Send + Sync + 'static {
    /// Current status code, or `None` if none has been set.
    fn status(&self) -> Option<u16>;

    /// Classification of [`SuccessOracle::status`].
    fn outcome(&self) -> Outcome {
        Outcome::classify(self.status())
    }
}

/// Oracle backed by the process-wide status slot.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseStatus;

impl ResponseStatus {
    /// Records the response/exit status for this process.
    pub fn set(code: u16) {
        CURRENT_STATUS.store(code, Ordering::SeqCst);
    }

    /// Forgets the recorded status.
    pub fn clear() {
        CURRENT_STATUS.store(0, Ordering::SeqCst);
    }

    /// Currently recorded status, if any.
    pub fn get() -> Option<u16> {
        match CURRENT_STATUS.load(Ordering::SeqCst) {
            0 => None,
            code => Some(code),
        }
    }
}

impl SuccessOracle for ResponseStatus {
    fn status(&self) -> Option<u16> {
        ResponseStatus::get()
    }
}

/// Oracle that always reports the same status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedStatus(pub u16);

impl SuccessOracle for FixedStatus {
    fn status(&self) -> Option<u16> {
        Some(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(Outcome::classify(None), Outcome::Success);
        assert_eq!(Outcome::classify(Some(200)), Outcome::Success);
        assert_eq!(Outcome::classify(Some(399)), Outcome::Success);
        assert_eq!(Outcome::classify(Some(400)), Outcome::Failure);
        assert_eq!(Outcome::classify(Some(500)), Outcome::Failure);
    }

    #[test]
    fn test_fixed_status() {
        assert!(FixedStatus(204).outcome().is_success());
        assert!(!FixedStatus(404).outcome().is_success());
    }
}
