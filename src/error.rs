//! Unified error types for the product controller.
//!
//! A single top-level `Error` enum that every subsystem converts into, so the
//! binary's error handling stays uniform.  Programmer errors inside the state
//! machine are not represented here; those are fatal and panic.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Error)]
pub enum Error {
    /// Controller configuration is invalid or could not be loaded.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    /// The logging engine rejected a request.
    #[error("dprint: {0}")]
    DPrint(#[from] DPrintError),
    /// The controller mailbox could not accept a message.
    #[error("mailbox: {0}")]
    Mailbox(#[from] MailboxError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The text is not valid JSON for [`ControllerConfig`](crate::config::ControllerConfig).
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field failed range validation.  The text names the field and why.
    #[error("validation failed: {0}")]
    ValidationFailed(&'static str),
}

// ---------------------------------------------------------------------------
// DPrint errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DPrintError {
    /// A level name or number that does not map to any level.
    #[error("unknown log level '{0}'")]
    UnknownLevel(String),
    /// An exact facility name that was never registered.
    #[error("unknown facility '{0}'")]
    UnknownFacility(String),
    /// The log file on removable media could not be opened.
    #[error("cannot open log file {0}")]
    LogFile(String),
    /// A `log` backend is already installed in this process.
    #[error("a logger is already installed")]
    AlreadyInstalled,
}

// ---------------------------------------------------------------------------
// Mailbox errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MailboxError {
    /// The bounded queue is full; the message was not posted.
    #[error("controller mailbox full")]
    Full,
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
