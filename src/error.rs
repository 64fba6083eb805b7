//! Error types, diagnostics and version information
//!
//! Every fallible entry point returns [`Result`]. Instances that can fail
//! also keep an [`ErrorInfo`] describing their most recent failure, which
//! can be rendered at any verbosity level.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

use thiserror::Error;

use crate::config::ParseConfigError;

pub const VERSION_MAJOR: u32 = parse_version(env!("CARGO_PKG_VERSION_MAJOR"));
pub const VERSION_MINOR: u32 = parse_version(env!("CARGO_PKG_VERSION_MINOR"));

/// Decimal version component; cargo guarantees plain digits
const fn parse_version(s: &str) -> u32 {
    let bytes = s.as_bytes();
    let mut val = 0;
    let mut i = 0;
    while i < bytes.len() {
        val = val * 10 + (bytes[i] - b'0') as u32;
        i += 1;
    }
    val
}

/// Return the running library version as `(major, minor)`
pub fn version() -> (u32, u32) {
    (VERSION_MAJOR, VERSION_MINOR)
}

// ============================================================================
// Verbosity
// ============================================================================

static VERBOSITY: AtomicI32 = AtomicI32::new(0);

/// Set the global debug verbosity level
pub fn set_verbosity(level: i32) {
    VERBOSITY.store(level, Ordering::Relaxed);
}

/// Increase the global debug verbosity level
///
/// The first call moves from 0 to 1, later calls double the level.
pub fn increase_verbosity() {
    // fetch_update only fails when the closure returns None
    let _ = VERBOSITY.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
        Some(if v <= 0 { 1 } else { v.saturating_mul(2) })
    });
}

/// Current global debug verbosity level
pub fn verbosity() -> i32 {
    VERBOSITY.load(Ordering::Relaxed)
}

/// Emit a debug record when the global verbosity is at least `level`
macro_rules! zprintf {
    ($level:expr, $($arg:tt)*) => {
        if $crate::error::verbosity() >= $level {
            ::log::debug!($($arg)*);
        }
    };
}

/// Bail out of the enclosing function with `retval` when `condition` fails
macro_rules! zassert {
    ($condition:expr, $retval:expr, $($arg:tt)*) => {
        if !$condition {
            ::log::trace!($($arg)*);
            return $retval;
        }
    };
}

pub(crate) use zassert;
pub(crate) use zprintf;

// ============================================================================
// Error
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("out of memory")]
    OutOfMemory,
    #[error("internal library error")]
    Internal,
    #[error("unsupported request")]
    Unsupported,
    #[error("invalid request")]
    Invalid,
    #[error("system error")]
    System,
    #[error("all resources busy")]
    Busy,
    #[error("output window is closed")]
    Closed,
    #[error("invalid configuration: {0}")]
    Parse(#[from] ParseConfigError),
}

impl Error {
    /// Numeric error code
    pub fn code(&self) -> i32 {
        match self {
            Self::OutOfMemory => 1,
            Self::Internal => 2,
            Self::Unsupported => 3,
            Self::Invalid | Self::Parse(_) => 4,
            Self::System => 5,
            Self::Busy => 7,
            Self::Closed => 10,
        }
    }

    /// Whether the error leaves the reporting instance unusable
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::OutOfMemory | Self::Internal)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ============================================================================
// Last-error object
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal = -2,
    Error = -1,
    Ok = 0,
    Warning = 1,
    Note = 2,
}

impl Severity {
    fn name(self) -> &'static str {
        match self {
            Self::Fatal => "FATAL ERROR",
            Self::Error => "ERROR",
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Note => "NOTE",
        }
    }
}

/// Component that owns an [`ErrorInfo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    ImageScanner,
    Decoder,
    Scanner,
}

impl Module {
    fn name(self) -> &'static str {
        match self {
            Self::ImageScanner => "image scanner",
            Self::Decoder => "decoder",
            Self::Scanner => "scanner",
        }
    }
}

/// Most recent failure reported by an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    module: Module,
    severity: Severity,
    func: &'static str,
    error: Option<Error>,
    detail: String,
}

impl ErrorInfo {
    pub(crate) fn new(module: Module) -> Self {
        Self {
            module,
            severity: Severity::Ok,
            func: "",
            error: None,
            detail: String::new(),
        }
    }

    /// Record a failure and hand the error back for propagation
    pub(crate) fn record(
        &mut self,
        severity: Severity,
        error: Error,
        func: &'static str,
        detail: impl Into<String>,
    ) -> Error {
        self.severity = severity;
        self.func = func;
        self.error = Some(error.clone());
        self.detail = detail.into();
        match severity {
            Severity::Fatal | Severity::Error => log::warn!("{}", self.error_string(1)),
            _ => log::debug!("{}", self.error_string(1)),
        }
        error
    }

    pub(crate) fn clear(&mut self) {
        self.severity = Severity::Ok;
        self.func = "";
        self.error = None;
        self.detail.clear();
    }

    pub fn module(&self) -> Module {
        self.module
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The recorded error, if any
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Numeric code of the recorded error (0 when none)
    pub fn code(&self) -> i32 {
        self.error.as_ref().map_or(0, Error::code)
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Render the error at the given verbosity
    ///
    /// Verbosity 0 yields just the error and its detail; higher levels add
    /// the severity, module and reporting function.
    pub fn error_string(&self, verbosity: i32) -> String {
        let err = match &self.error {
            Some(e) => e.to_string(),
            None => "no error".to_string(),
        };
        if verbosity <= 0 {
            if self.detail.is_empty() {
                return err;
            }
            return format!("{err}: {}", self.detail);
        }
        format!(
            "{}: zedscan {} in {}():\n    {}: {}",
            self.severity.name(),
            self.module.name(),
            self.func,
            err,
            self.detail
        )
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.error_string(verbosity()))
    }
}
