//! # Collector: keeps every event in memory
//!
//! Useful for asserting on failures in tests, or for surfacing cleanup
//! errors to the caller after a drain.

use std::sync::{Mutex, PoisonError};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that records all events it receives.
#[derive(Default, Debug)]
pub struct Collector {
    events: Mutex<Vec<Event>>,
}

impl Collector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Kinds of all recorded events, in order.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }

    /// Recorded events of one kind.
    pub fn of_kind(&self, kind: EventKind) -> Vec<Event> {
        self.events().into_iter().filter(|e| e.kind == kind).collect()
    }

    /// Drops all recorded events.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Subscribe for Collector {
    fn on_event(&self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }

    fn name(&self) -> &'static str {
        "Collector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order_and_clears() {
        let c = Collector::new();
        c.on_event(&Event::new(EventKind::DrainStarted));
        c.on_event(&Event::new(EventKind::TaskFailed));
        c.on_event(&Event::new(EventKind::DrainFinished));

        assert_eq!(
            c.kinds(),
            vec![EventKind::DrainStarted, EventKind::TaskFailed, EventKind::DrainFinished]
        );
        assert_eq!(c.of_kind(EventKind::TaskFailed).len(), 1);

        c.clear();
        assert!(c.events().is_empty());
    }
}
