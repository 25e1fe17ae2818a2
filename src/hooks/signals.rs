//! # Termination-signal hook.
//!
//! [`SignalHook`] runs the process-end callback of every live handler when the
//! process receives a termination signal, then (optionally) exits with `128 + signo`.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//! - `SIGHUP` (controlling terminal closed)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::windows::ctrl_c`]
//!
//! ## Architecture
//! ```text
//! first register(cb)                 (caller thread)
//!   ├─ build current-thread runtime
//!   ├─ install listeners             (errors returned as HookError::Io)
//!   └─ spawn "taskdefer-signals" ──► block_on(loop {
//!                                      signo = listeners.recv()
//!                                      CALLBACKS.fire()          (may be none)
//!                                      exit_on_signal? ─► exit(128 + signo)
//!                                    })
//! every register(cb) ─► CALLBACKS.attach(cb), store exit_on_signal
//! ```
//!
//! The watcher lives for the rest of the process: the runtime's OS-level
//! handlers cannot be removed, so it keeps honouring `exit_on_signal` even
//! after every handler has been dropped. The most recent registration decides
//! whether the process exits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::slot::CallbackSlot;
use super::{ObserveProcessEnd, ProcessEndFn, SIGNALS};
use crate::error::HookError;

static WATCHING: Mutex<bool> = Mutex::new(false);
static EXIT_ON_SIGNAL: AtomicBool = AtomicBool::new(true);
static CALLBACKS: CallbackSlot = CallbackSlot::new();

/// Process-end hook driven by termination signals.
#[derive(Debug, Clone, Copy)]
pub struct SignalHook {
    enabled: bool,
    exit_on_signal: bool,
}

impl SignalHook {
    /// Creates a hook; a disabled hook reports itself unavailable.
    pub fn new(enabled: bool, exit_on_signal: bool) -> Self {
        Self {
            enabled,
            exit_on_signal,
        }
    }

    fn io_error(source: std::io::Error) -> HookError {
        HookError::Io {
            mechanism: SIGNALS,
            source,
        }
    }

    /// Starts the process-wide watcher thread.
    fn spawn_watcher() -> Result<(), HookError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Self::io_error)?;
        let listeners = {
            let _guard = rt.enter();
            listeners::Listeners::install().map_err(Self::io_error)?
        };

        std::thread::Builder::new()
            .name("taskdefer-signals".into())
            .spawn(move || rt.block_on(watch(listeners)))
            .map_err(Self::io_error)?;
        Ok(())
    }
}

/// Runs for the rest of the process.
async fn watch(mut listeners: listeners::Listeners) {
    loop {
        let signo = listeners.recv().await;
        CALLBACKS.fire();
        if EXIT_ON_SIGNAL.load(Ordering::SeqCst) {
            std::process::exit(128 + signo);
        }
    }
}

impl ObserveProcessEnd for SignalHook {
    fn capability(&self) -> &'static str {
        SIGNALS
    }

    fn is_available(&self) -> bool {
        self.enabled && cfg!(any(unix, windows))
    }

    fn methods(&self) -> Vec<&'static str> {
        listeners::METHODS.to_vec()
    }

    fn register(&self, on_end: ProcessEndFn) -> Result<(), HookError> {
        if !self.is_available() {
            return Err(HookError::Unsupported { mechanism: SIGNALS });
        }

        let mut watching = WATCHING.lock().unwrap_or_else(PoisonError::into_inner);
        if !*watching {
            Self::spawn_watcher()?;
            *watching = true;
        }
        EXIT_ON_SIGNAL.store(self.exit_on_signal, Ordering::SeqCst);
        CALLBACKS.attach(&on_end);
        Ok(())
    }
}

#[cfg(unix)]
mod listeners {
    use tokio::signal::unix::{Signal, SignalKind, signal};

    pub(super) const METHODS: [&str; 4] = ["SIGINT", "SIGTERM", "SIGQUIT", "SIGHUP"];

    pub(super) struct Listeners {
        int: Signal,
        term: Signal,
        quit: Signal,
        hup: Signal,
    }

    impl Listeners {
        /// Must be called inside a runtime context.
        pub(super) fn install() -> std::io::Result<Self> {
            Ok(Self {
                int: signal(SignalKind::interrupt())?,
                term: signal(SignalKind::terminate())?,
                quit: signal(SignalKind::quit())?,
                hup: signal(SignalKind::hangup())?,
            })
        }

        /// Waits for the first signal and returns its number.
        pub(super) async fn recv(&mut self) -> i32 {
            tokio::select! {
                _ = self.int.recv()  => libc::SIGINT,
                _ = self.term.recv() => libc::SIGTERM,
                _ = self.quit.recv() => libc::SIGQUIT,
                _ = self.hup.recv()  => libc::SIGHUP,
            }
        }
    }
}

#[cfg(windows)]
mod listeners {
    use tokio::signal::windows::{CtrlC, ctrl_c};

    pub(super) const METHODS: [&str; 1] = ["ctrl_c"];

    /// Conventional number reported for Ctrl-C.
    const CTRL_C_SIGNO: i32 = 2;

    pub(super) struct Listeners {
        ctrl_c: CtrlC,
    }

    impl Listeners {
        /// Must be called inside a runtime context.
        pub(super) fn install() -> std::io::Result<Self> {
            Ok(Self { ctrl_c: ctrl_c()? })
        }

        pub(super) async fn recv(&mut self) -> i32 {
            let _ = self.ctrl_c.recv().await;
            CTRL_C_SIGNO
        }
    }
}

#[cfg(not(any(unix, windows)))]
mod listeners {
    pub(super) const METHODS: [&str; 0] = [];

    pub(super) struct Listeners;

    impl Listeners {
        pub(super) fn install() -> std::io::Result<Self> {
            Err(std::io::Error::from(std::io::ErrorKind::Unsupported))
        }

        pub(super) async fn recv(&mut self) -> i32 {
            std::future::pending().await
        }
    }
}
