//! DPrint: facility-scoped, level-filtered logging with runtime
//! reconfiguration.
//!
//! ```text
//!   DPrint("Alpha") ─┐
//!   DPrint("Alpha") ─┼──▶ LoggerRegistry ──▶ Output ──▶ syslog | stdout | file
//!   log::info!(..) ──┘        ▲
//!        (bridge)             └── BOSE_DPRINT_CONF / dprint.conf / console commands
//! ```
//!
//! Components either hold a [`DPrint`] handle naming their facility, or log
//! through the `log` macros once [`install`] has made the registry the
//! `log` backend (the record target becomes the facility name).

mod backend;
mod bridge;
mod config;
mod level;
mod registry;

use core::fmt;
use std::sync::{Arc, OnceLock};

pub use backend::{MAX_MESSAGE_LEN, OutputLocation, TRUNCATION_MARK};
pub use bridge::{DPrintLogger, install};
pub use config::{ConfigCommand, ConfigLine, ConfigSource, ParsedConfig, parse as parse_config};
pub use level::LogLevel;
pub use registry::{FacilityId, LoggerRegistry, MAX_FACILITIES, UNKNOWN_FACILITY};

use crate::config::DPrintSettings;

static DEFAULT_REGISTRY: OnceLock<Arc<LoggerRegistry>> = OnceLock::new();

/// The process-wide registry used by [`DPrint::new`] and the convenience
/// functions below.  Created with default settings on first use unless
/// [`init_default_registry`] ran first.
pub fn default_registry() -> &'static Arc<LoggerRegistry> {
    DEFAULT_REGISTRY.get_or_init(|| Arc::new(LoggerRegistry::default()))
}

/// Create the process-wide registry from `settings`.  Returns the existing
/// registry unchanged when one was already created.
pub fn init_default_registry(settings: DPrintSettings) -> &'static Arc<LoggerRegistry> {
    DEFAULT_REGISTRY.get_or_init(|| Arc::new(LoggerRegistry::new(settings)))
}

/// Set the application identity on the default registry and load its
/// configuration.
pub fn initialize(app_name: &str) {
    default_registry().initialize(app_name);
}

/// Cut `text` to at most `max` bytes for logging, marking the cut with
/// `...`.
pub fn limit(text: &str, max: usize) -> String {
    const ELLIPSIS: &str = "...";
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max.saturating_sub(ELLIPSIS.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{ELLIPSIS}", &text[..end])
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// A reference on one facility.  Clones share the slot; the slot is freed
/// when the last handle for the name is dropped.
pub struct DPrint {
    registry: Arc<LoggerRegistry>,
    id: FacilityId,
}

impl DPrint {
    /// Register `facility` with the default registry.
    pub fn new(facility: &str) -> Self {
        Self::with_registry(Arc::clone(default_registry()), facility)
    }

    pub fn with_registry(registry: Arc<LoggerRegistry>, facility: &str) -> Self {
        let id = registry.register(facility);
        Self { registry, id }
    }

    pub fn id(&self) -> FacilityId {
        self.id
    }

    pub fn registry(&self) -> &Arc<LoggerRegistry> {
        &self.registry
    }

    pub fn facility(&self) -> String {
        self.registry.facility_name(self.id).unwrap_or_default()
    }

    pub fn is_log(&self, level: LogLevel) -> bool {
        self.registry.is_log(self.id, level)
    }

    /// Emit at `level` if the facility currently allows it.
    pub fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if self.is_log(level) {
            self.registry.log(self.id, level, args);
        }
    }

    pub fn log_critical(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Critical, args);
    }

    pub fn log_error(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }

    pub fn log_warning(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Warning, args);
    }

    pub fn log_info(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    pub fn log_debug(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    pub fn log_verbose(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Verbose, args);
    }

    pub fn log_insane(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Insane, args);
    }
}

impl Clone for DPrint {
    fn clone(&self) -> Self {
        self.registry.retain(self.id);
        Self {
            registry: Arc::clone(&self.registry),
            id: self.id,
        }
    }
}

impl Drop for DPrint {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}

impl fmt::Debug for DPrint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DPrint")
            .field("id", &self.id)
            .field("facility", &self.facility())
            .finish()
    }
}

/// Log through a [`DPrint`] handle with `format!` syntax.  Arguments are
/// not evaluated when the level is filtered out.
///
/// ```ignore
/// dprint!(DPRINT, LogLevel::Critical, "LPM link lost ({} retries)", n);
/// ```
#[macro_export]
macro_rules! dprint {
    ($handle:expr, $level:expr, $($arg:tt)+) => {{
        let handle: &$crate::dprint::DPrint = &$handle;
        let level: $crate::dprint::LogLevel = $level;
        if handle.is_log(level) {
            handle.registry().log(handle.id(), level, format_args!($($arg)+));
        }
    }};
}
