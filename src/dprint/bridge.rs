//! `log` facade backend.
//!
//! Every `log` record is routed to the facility named by its target (the
//! module path unless the call site overrides it).  Unknown targets are
//! registered on first use with a reference owned by the registry, so
//! `productctl::product*` style patterns cover whole module subtrees.

use std::sync::Arc;

use crate::error::DPrintError;

use super::level::LogLevel;
use super::registry::LoggerRegistry;

pub struct DPrintLogger {
    registry: Arc<LoggerRegistry>,
}

impl DPrintLogger {
    pub fn new(registry: Arc<LoggerRegistry>) -> Self {
        Self { registry }
    }
}

impl log::Log for DPrintLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        let id = self.registry.facility_for(metadata.target());
        self.registry.is_log(id, LogLevel::from(metadata.level()))
    }

    fn log(&self, record: &log::Record<'_>) {
        let id = self.registry.facility_for(record.target());
        let level = LogLevel::from(record.level());
        if self.registry.is_log(id, level) {
            self.registry.log(id, level, *record.args());
        }
    }

    fn flush(&self) {}
}

/// Make `registry` the `log` backend for the rest of the process.
pub fn install(registry: Arc<LoggerRegistry>) -> Result<(), DPrintError> {
    log::set_boxed_logger(Box::new(DPrintLogger::new(registry)))
        .map_err(|_| DPrintError::AlreadyInstalled)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
