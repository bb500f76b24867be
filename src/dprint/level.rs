//! DPrint severity levels.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DPrintError;

/// Ordered severity.  Lower values are more severe; a facility configured
/// at level N emits every message whose level is numerically <= N.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum LogLevel {
    Critical = 0,
    Error = 1,
    Warning = 2,
    Info = 3,
    Debug = 4,
    /// Historical test-automation level.  Never produced by this crate.
    #[serde(rename = "TESTAUTO")]
    TestAuto = 5,
    Verbose = 6,
    Insane = 7,
}

impl LogLevel {
    pub const ALL: [LogLevel; 8] = [
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Info,
        Self::Debug,
        Self::TestAuto,
        Self::Verbose,
        Self::Insane,
    ];

    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    /// Upper-case name used in log prefixes and the status table.
    pub fn name(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::TestAuto => "TESTAUTO",
            Self::Verbose => "VERBOSE",
            Self::Insane => "INSANE",
        }
    }

    /// Lenient lookup for administrative callers: case-insensitive names,
    /// the digits 0-7 and the historical test-automation aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(level) = Self::from_digit(name) {
            return Some(level);
        }
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "test" | "test_automation" | "testauto" => Some(Self::TestAuto),
            _ => Self::ALL
                .iter()
                .copied()
                .find(|l| l.name().eq_ignore_ascii_case(&lower)),
        }
    }

    /// Strict lookup used by the configuration grammar: a single digit or
    /// an exact lower-case name.
    pub fn from_config_token(token: &str) -> Option<Self> {
        if let Some(level) = Self::from_digit(token) {
            return Some(level);
        }
        let level = match token {
            "critical" => Self::Critical,
            "error" => Self::Error,
            "warning" => Self::Warning,
            "info" => Self::Info,
            "debug" => Self::Debug,
            "test_automation" => Self::TestAuto,
            "verbose" => Self::Verbose,
            "insane" => Self::Insane,
            _ => return None,
        };
        Some(level)
    }

    fn from_digit(s: &str) -> Option<Self> {
        match s.as_bytes() {
            [d @ b'0'..=b'7'] => Self::from_u8(d - b'0'),
            _ => None,
        }
    }

    /// Kernel-style syslog priority (without the facility bits).
    pub fn syslog_priority(self) -> u8 {
        match self {
            Self::Critical => 2,
            Self::Error => 3,
            Self::Warning => 4,
            Self::Info => 6,
            Self::Debug | Self::Verbose | Self::Insane => 7,
            Self::TestAuto => 1,
        }
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warning,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Verbose,
        }
    }
}

/// Same rules as [`LogLevel::from_name`].
impl FromStr for LogLevel {
    type Err = DPrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| DPrintError::UnknownLevel(s.to_string()))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
