//! Runtime events: the error-observation sink payload.
//!
//! Every stack drain, eviction, skipped terminate entry, task failure and
//! hook registration is described by an [`Event`] and handed to the
//! owning handler's [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`StackKind`] which stack an event originated from
//!
//! ## Quick reference
//! - **Publishers**: `BoundedStack` drains (via `runner::run_once`),
//!   `TerminateHandler`, `CapabilityRegistrar`, `ProcessHandler`.
//! - **Consumers**: `SubscriberSet` (fans out to [`LogWriter`](crate::LogWriter)
//!   and user subscribers).

mod event;

pub use event::{Event, EventKind, StackKind};
