//! Host environment detection.
//!
//! The execution environment ("sapi") decides which process-end mechanisms
//! make sense: a FastCGI worker ends a *request* long before the process
//! exits, while a CLI run only ends once.
//!
//! Detection follows the CGI/FastCGI conventions:
//! - `FCGI_ROLE` set ─► [`Sapi::FastCgi`]
//! - `GATEWAY_INTERFACE` set ─► [`Sapi::Cgi`]
//! - otherwise ─► [`Sapi::Cli`]

/// Execution-environment classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sapi {
    /// Command-line style run: the process ends once.
    Cli,
    /// Classic CGI: one process per request.
    Cgi,
    /// FastCGI worker: many requests per process.
    FastCgi,
}

impl Sapi {
    /// Detects the environment from the process environment variables.
    pub fn detect() -> Self {
        Self::from_vars(|key| std::env::var_os(key).is_some())
    }

    /// Classifies using an arbitrary "is variable set" lookup.
    pub fn from_vars(is_set: impl Fn(&str) -> bool) -> Self {
        if is_set("FCGI_ROLE") {
            Sapi::FastCgi
        } else if is_set("GATEWAY_INTERFACE") {
            Sapi::Cgi
        } else {
            Sapi::Cli
        }
    }

    /// Stable lowercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sapi::Cli => "cli",
            Sapi::Cgi => "cgi",
            Sapi::FastCgi => "fastcgi",
        }
    }

    #[inline]
    pub fn is_fastcgi(&self) -> bool {
        matches!(self, Sapi::FastCgi)
    }
}

/// Platform identifier (`linux`, `macos`, `windows`, ...).
#[inline]
pub fn platform() -> &'static str {
    std::env::consts::OS
}
