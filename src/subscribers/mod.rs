//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations
//! for observing events emitted by deferred-task handlers.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   drain / hook ── emit(&Event) ──► SubscriberSet ──► Subscribe::on_event(&Event)
//!                                                        │
//!                                                   ┌────┴─────┬──────────┐
//!                                                   ▼          ▼          ▼
//!                                               LogWriter  Collector   Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use taskdefer::{Subscribe, Event, EventKind};
//!
//! struct FailureCounter(std::sync::atomic::AtomicUsize);
//!
//! impl Subscribe for FailureCounter {
//!     fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::TaskFailed {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//! }
//! ```

mod collect;
mod log;
mod set;
mod subscribe;

pub use collect::Collector;
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
