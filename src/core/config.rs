//! # Handler configuration.
//!
//! Provides [`Config`], the settings used when building a
//! [`ProcessHandler`](crate::ProcessHandler) and its function scopes.
//!
//! ## Sentinel values
//! - capacities of `0` are clamped to `1` (a stack always holds at least one task)

/// Capacity of the process-wide global stack.
pub const GLOBAL_CAPACITY: usize = 100;
/// Capacity of each function-scope stack.
pub const SCOPE_CAPACITY: usize = 50;
/// Capacity of the terminate stack.
pub const TERMINATE_CAPACITY: usize = 50;

/// Configuration for deferred-task handlers.
///
/// ## Field semantics
/// - `global_capacity`: tasks retained by the global stack (oldest evicted first)
/// - `scope_capacity`: tasks retained by each function scope created by the handler
/// - `terminate_capacity`: entries retained by the terminate stack
/// - `watch_signals`: arm the termination-signal hook (requires feature `signals`)
/// - `exit_on_signal`: after a signal-triggered drain, exit with `128 + signo`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of tasks held by the global stack.
    pub global_capacity: usize,

    /// Maximum number of tasks held by a function scope.
    pub scope_capacity: usize,

    /// Maximum number of entries held by the terminate stack.
    pub terminate_capacity: usize,

    /// Whether SIGINT/SIGTERM/SIGQUIT/SIGHUP (Ctrl-C on Windows) trigger the process-end sequence.
    ///
    /// Installing the watcher replaces the default disposition of those signals for
    /// the rest of the process lifetime.
    pub watch_signals: bool,

    /// Whether the process exits after a signal-triggered drain.
    ///
    /// When `false` the drain runs and the process keeps going.
    pub exit_on_signal: bool,
}

impl Config {
    /// Global stack capacity clamped to a minimum of 1.
    #[inline]
    pub fn global_capacity_clamped(&self) -> usize {
        self.global_capacity.max(1)
    }

    /// Scope stack capacity clamped to a minimum of 1.
    #[inline]
    pub fn scope_capacity_clamped(&self) -> usize {
        self.scope_capacity.max(1)
    }

    /// Terminate stack capacity clamped to a minimum of 1.
    #[inline]
    pub fn terminate_capacity_clamped(&self) -> usize {
        self.terminate_capacity.max(1)
    }

    /// Defaults without any signal handling; the `atexit` hook is still armed.
    pub fn without_signals() -> Self {
        Self {
            watch_signals: false,
            ..Self::default()
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `global_capacity = 100`
    /// - `scope_capacity = 50`
    /// - `terminate_capacity = 50`
    /// - `watch_signals = true`
    /// - `exit_on_signal = true`
    fn default() -> Self {
        Self {
            global_capacity: GLOBAL_CAPACITY,
            scope_capacity: SCOPE_CAPACITY,
            terminate_capacity: TERMINATE_CAPACITY,
            watch_signals: true,
            exit_on_signal: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.global_capacity, 100);
        assert_eq!(cfg.scope_capacity, 50);
        assert_eq!(cfg.terminate_capacity, 50);
        assert!(cfg.watch_signals);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cfg = Config {
            global_capacity: 0,
            scope_capacity: 0,
            terminate_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.global_capacity_clamped(), 1);
        assert_eq!(cfg.scope_capacity_clamped(), 1);
        assert_eq!(cfg.terminate_capacity_clamped(), 1);
    }

    #[test]
    fn test_without_signals() {
        let cfg = Config::without_signals();
        assert!(!cfg.watch_signals);
        assert_eq!(cfg.global_capacity, GLOBAL_CAPACITY);
    }
}
