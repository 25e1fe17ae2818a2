//! # Process-end observation.
//!
//! A host can tell us "the process (or request) is ending" in several ways.
//! Each way is one [`ObserveProcessEnd`] implementation; the
//! [`CapabilityRegistrar`] probes all of them and attaches the process-end
//! callback to every one that is available.
//!
//! | Capability               | Mechanism                                   | Type              |
//! |--------------------------|---------------------------------------------|-------------------|
//! | `shutdown_function`      | C `atexit` (normal exit, return from main)  | [`ExitHook`]      |
//! | `signals`                | SIGINT/SIGTERM/SIGQUIT/SIGHUP, Ctrl-C        | `SignalHook`      |
//! | `fastcgi_finish_request` | request completion reported by the host     | [`RequestEndHook`]|
//!
//! ```text
//! CapabilityRegistrar::register()
//!   for observer in observers:
//!     available? ── no ──► publish HookUnavailable
//!         └ yes ─► observer.register(cb)
//!                    ├─ Ok  ─► publish HookRegistered
//!                    └─ Err ─► publish HookUnavailable   (never propagated)
//!
//! cb() = publish ProcessEndTriggered{mechanism} ; on_end()
//! ```
//!
//! Several mechanisms may fire for the same shutdown (a signal handler exits,
//! which then runs `atexit`); the downstream drains are no-ops once empty.
//!
//! The built-in mechanisms exist once per process and are shared by every live
//! handler. They keep only weak references to the callbacks; the registrar owns
//! them, so dropping a handler detaches it everywhere.

pub mod env;
mod exit;
mod request;
#[cfg(feature = "signals")]
mod signals;
mod slot;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::core::config::Config;
use crate::error::HookError;
use crate::events::{Event, EventKind};
use crate::subscribers::SubscriberSet;

pub use env::Sapi;
pub use exit::ExitHook;
pub use request::{RequestEndHook, finish_request};
#[cfg(feature = "signals")]
pub use signals::SignalHook;

/// Capability name of the `atexit` fallback; always available.
pub const SHUTDOWN_FUNCTION: &str = "shutdown_function";
/// Capability name of trappable termination signals.
pub const SIGNALS: &str = "signals";
/// Capability name of FastCGI request-completion callbacks.
pub const FASTCGI_FINISH_REQUEST: &str = "fastcgi_finish_request";

const KNOWN_CAPABILITIES: [&str; 3] = [SHUTDOWN_FUNCTION, SIGNALS, FASTCGI_FINISH_REQUEST];

/// Callback run when a mechanism observes the end of the process.
pub type ProcessEndFn = Arc<dyn Fn() + Send + Sync + 'static>;

/// One host mechanism able to observe the end of the process.
pub trait ObserveProcessEnd: Send + Sync {
    /// Capability name reported in [`CapabilityReport::capabilities`].
    fn capability(&self) -> &'static str;

    /// Whether the host supports this mechanism right now. Must not mutate anything.
    fn is_available(&self) -> bool;

    /// Concrete methods this mechanism would attach to (e.g. signal names).
    fn methods(&self) -> Vec<&'static str>;

    /// Attaches `on_end` to the mechanism.
    ///
    /// The registrar keeps `on_end` alive for its own lifetime, so an
    /// implementation may hold it weakly.
    fn register(&self, on_end: ProcessEndFn) -> Result<(), HookError>;
}

/// Immutable snapshot of the host's process-end capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityReport {
    /// Platform identifier.
    pub platform: &'static str,
    /// Execution-environment identifier.
    pub sapi: &'static str,
    /// Methods of every available mechanism.
    pub methods: Vec<&'static str>,
    /// Capability name → available.
    pub capabilities: BTreeMap<&'static str, bool>,
}

impl CapabilityReport {
    /// Availability of one capability; unknown names are `false`.
    pub fn has(&self, name: &str) -> bool {
        self.capabilities.get(name).copied().unwrap_or(false)
    }
}

/// Probes process-end mechanisms and wires the process-end callback into them.
pub struct CapabilityRegistrar {
    on_end: ProcessEndFn,
    observers: Vec<Box<dyn ObserveProcessEnd>>,
    attached: Mutex<Vec<ProcessEndFn>>,
    subs: Arc<SubscriberSet>,
    sapi: Sapi,
}

impl CapabilityRegistrar {
    /// Creates a registrar over the default mechanisms for `cfg`.
    pub fn new(on_end: ProcessEndFn, subs: Arc<SubscriberSet>, cfg: &Config) -> Self {
        let sapi = Sapi::detect();
        Self::with_observers(on_end, subs, default_observers(cfg, sapi))
    }

    /// Creates a registrar over an explicit list of mechanisms.
    pub fn with_observers(
        on_end: ProcessEndFn,
        subs: Arc<SubscriberSet>,
        observers: Vec<Box<dyn ObserveProcessEnd>>,
    ) -> Self {
        Self {
            on_end,
            observers,
            attached: Mutex::new(Vec::new()),
            subs,
            sapi: Sapi::detect(),
        }
    }

    /// Probes every mechanism. Side-effect free; a fresh report per call.
    pub fn capabilities(&self) -> CapabilityReport {
        let mut capabilities: BTreeMap<&'static str, bool> =
            KNOWN_CAPABILITIES.iter().map(|name| (*name, false)).collect();
        capabilities.insert(SHUTDOWN_FUNCTION, true);

        let mut methods = Vec::new();
        for obs in &self.observers {
            let available = obs.is_available();
            let slot = capabilities.entry(obs.capability()).or_insert(false);
            *slot |= available;
            if available {
                methods.extend(obs.methods());
            }
        }

        CapabilityReport {
            platform: env::platform(),
            sapi: self.sapi.as_str(),
            methods,
            capabilities,
        }
    }

    /// Availability of one capability.
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities().has(name)
    }

    /// Attaches the process-end callback to every available mechanism.
    ///
    /// Never fails; returns the number of mechanisms attached.
    pub fn register(&self) -> usize {
        let mut attached = 0;
        for obs in &self.observers {
            let mechanism = obs.capability();
            if !obs.is_available() {
                self.publish_unavailable(mechanism, "not supported in this environment");
                continue;
            }
            let trigger = self.trigger_for(mechanism);
            match obs.register(Arc::clone(&trigger)) {
                Ok(()) => {
                    attached += 1;
                    self.attached
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(trigger);
                    self.subs
                        .emit(&Event::new(EventKind::HookRegistered).with_mechanism(mechanism));
                }
                Err(e) => self.publish_unavailable(mechanism, &e.to_string()),
            }
        }
        attached
    }

    /// Wraps `on_end` so the trigger is observable.
    fn trigger_for(&self, mechanism: &'static str) -> ProcessEndFn {
        let on_end = Arc::clone(&self.on_end);
        let subs = Arc::clone(&self.subs);
        Arc::new(move || {
            subs.emit(&Event::new(EventKind::ProcessEndTriggered).with_mechanism(mechanism));
            on_end();
        })
    }

    fn publish_unavailable(&self, mechanism: &'static str, reason: &str) {
        self.subs.emit(
            &Event::new(EventKind::HookUnavailable)
                .with_mechanism(mechanism)
                .with_reason(reason),
        );
    }
}

impl std::fmt::Debug for CapabilityRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistrar")
            .field(
                "observers",
                &self.observers.iter().map(|o| o.capability()).collect::<Vec<_>>(),
            )
            .field("sapi", &self.sapi)
            .finish()
    }
}

/// `atexit` always, then signals (if compiled in and enabled), then request-end.
#[cfg_attr(not(feature = "signals"), allow(unused_variables))]
fn default_observers(cfg: &Config, sapi: Sapi) -> Vec<Box<dyn ObserveProcessEnd>> {
    let mut observers: Vec<Box<dyn ObserveProcessEnd>> = vec![Box::new(ExitHook)];
    #[cfg(feature = "signals")]
    observers.push(Box::new(SignalHook::new(
        cfg.watch_signals,
        cfg.exit_on_signal,
    )));
    observers.push(Box::new(RequestEndHook::new(sapi)));
    observers
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::subscribers::Collector;

    /// Mechanism that records its callback so a test can fire it.
    struct Manual {
        name: &'static str,
        available: bool,
        fail: bool,
        cb: Mutex<Option<ProcessEndFn>>,
    }

    impl Manual {
        fn new(name: &'static str, available: bool, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                available,
                fail,
                cb: Mutex::new(None),
            })
        }

        fn fire(&self) {
            let cb = self.cb.lock().unwrap().clone();
            if let Some(cb) = cb {
                cb();
            }
        }
    }

    impl ObserveProcessEnd for Arc<Manual> {
        fn capability(&self) -> &'static str {
            self.name
        }
        fn is_available(&self) -> bool {
            self.available
        }
        fn methods(&self) -> Vec<&'static str> {
            vec![self.name]
        }
        fn register(&self, on_end: ProcessEndFn) -> Result<(), HookError> {
            if self.fail {
                return Err(HookError::Io {
                    mechanism: self.name,
                    source: std::io::Error::other("refused"),
                });
            }
            *self.cb.lock().unwrap() = Some(on_end);
            Ok(())
        }
    }

    fn counter() -> (Arc<AtomicUsize>, ProcessEndFn) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let cb: ProcessEndFn = Arc::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        (hits, cb)
    }

    #[test]
    fn test_report_always_has_shutdown_function() {
        let (_, cb) = counter();
        let reg = CapabilityRegistrar::with_observers(cb, Arc::new(SubscriberSet::new(vec![])), vec![]);

        let report = reg.capabilities();

        assert!(report.has(SHUTDOWN_FUNCTION));
        assert!(reg.has_capability("shutdown_function"));
        assert!(!reg.has_capability("nonexistent_capability"));
        assert_eq!(report.platform, std::env::consts::OS);
        assert_eq!(report.capabilities.len(), KNOWN_CAPABILITIES.len());
    }

    #[test]
    fn test_report_is_fresh_and_stable() {
        let (_, cb) = counter();
        let reg = CapabilityRegistrar::with_observers(
            cb,
            Arc::new(SubscriberSet::new(vec![])),
            vec![Box::new(Manual::new(SIGNALS, true, false))],
        );
        assert_eq!(reg.capabilities(), reg.capabilities());
        assert_eq!(reg.capabilities().methods, vec![SIGNALS]);
    }

    #[test]
    fn test_register_attaches_available_and_skips_failures() {
        let c = Arc::new(Collector::new());
        let (hits, cb) = counter();
        let good = Manual::new(SIGNALS, true, false);
        let missing = Manual::new(FASTCGI_FINISH_REQUEST, false, false);
        let broken = Manual::new("broken", true, true);
        let reg = CapabilityRegistrar::with_observers(
            cb,
            Arc::new(SubscriberSet::new(vec![c.clone()])),
            vec![
                Box::new(good.clone()),
                Box::new(missing.clone()),
                Box::new(broken.clone()),
            ],
        );

        assert_eq!(reg.register(), 1);
        assert_eq!(c.of_kind(EventKind::HookRegistered).len(), 1);
        assert_eq!(c.of_kind(EventKind::HookUnavailable).len(), 2);

        good.fire();
        good.fire();
        missing.fire();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        let triggered = c.of_kind(EventKind::ProcessEndTriggered);
        assert_eq!(triggered.len(), 2);
        assert_eq!(triggered[0].mechanism, Some(SIGNALS));
    }

    #[test]
    fn test_default_registrar_registers_without_panicking() {
        let (_, cb) = counter();
        let reg = CapabilityRegistrar::new(
            cb,
            Arc::new(SubscriberSet::new(vec![])),
            &Config::without_signals(),
        );
        assert!(reg.register() >= 1);
        assert!(!reg.has_capability(SIGNALS));
    }
}
