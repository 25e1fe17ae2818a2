//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers into
//! the error-observation sink.
//!
//! ## Contract
//! - `on_event` is called synchronously on the thread that is draining, in
//!   emission order.
//! - Implementations should be quick; a panicking subscriber is isolated by
//!   [`SubscriberSet`](crate::SubscriberSet) and never interrupts a drain.
//! - Implementations must not register or drain deferred tasks on the same
//!   handler from inside `on_event`.

use crate::events::Event;

/// Contract for event subscribers.
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
