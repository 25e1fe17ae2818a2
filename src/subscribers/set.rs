//! # SubscriberSet: synchronous fan-out over multiple subscribers
//!
//! [`SubscriberSet`] delivers each [`Event`](crate::events::Event) to every
//! subscriber in registration order.
//!
//! ## What it guarantees
//! - Per-subscriber delivery in emission order.
//! - Panics inside subscribers are caught and logged (isolation); the
//!   remaining subscribers still see the event.
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        ├──► S1.on_event()   (catch_unwind)
//!        ├──► S2.on_event()   (catch_unwind)
//!        └──► SN.on_event()   (catch_unwind)
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};

use crate::events::Event;

use super::{LogWriter, Subscribe};

/// Composite fan-out over a fixed list of subscribers.
#[derive(Clone)]
pub struct SubscriberSet {
    subs: Vec<Arc<dyn Subscribe>>,
}

impl SubscriberSet {
    /// Creates a set over the given subscribers.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { subs }
    }

    /// A set with only the built-in [`LogWriter`].
    #[must_use]
    pub fn with_log_writer() -> Self {
        Self::new(vec![Arc::new(LogWriter::new())])
    }

    /// Process-wide shared set holding only the built-in [`LogWriter`].
    ///
    /// Used by function scopes so that creating one does not allocate a new set.
    pub fn shared_default() -> Arc<SubscriberSet> {
        static SHARED: OnceLock<Arc<SubscriberSet>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(SubscriberSet::with_log_writer())))
    }

    /// Delivers one event to all subscribers.
    pub fn emit(&self, event: &Event) {
        for sub in &self.subs {
            if let Err(panic_err) = catch_unwind(AssertUnwindSafe(|| sub.on_event(event))) {
                tracing::error!(
                    subscriber = sub.name(),
                    info = %crate::core::runner::panic_message(panic_err.as_ref()),
                    "subscriber panicked"
                );
            }
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subs.len()
    }
}

impl Default for SubscriberSet {
    fn default() -> Self {
        Self::with_log_writer()
    }
}

impl std::fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.subs.iter().map(|s| s.name()))
            .finish()
    }
}
