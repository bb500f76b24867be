//! Controller configuration parameters.
//!
//! All tunable parameters for the product controller and the logging
//! engine.  Loaded from JSON; anything missing falls back to the default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dprint::LogLevel;
use crate::error::ConfigError;

/// Upper bound for `intent_cache_depth`; the cache itself is fixed-size.
pub const MAX_INTENT_CACHE_DEPTH: usize = 8;

/// Core controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // --- Identity ---
    /// Name used as the log identity and in the startup banner.
    pub product_name: String,

    // --- Boot ---
    /// Play the first-boot greeting before the first network standby.
    pub first_boot_greeting: bool,
    /// Enter Setup after boot even if a network is configured.
    pub force_setup: bool,

    // --- Audio ---
    /// Volume is clamped to this level when playback starts (0-100).
    pub volume_threshold: u8,
    /// Volume assumed at boot (0-100).
    pub default_volume: u8,

    // --- AdaptIQ ---
    /// Inactivity timeout while an AdaptIQ calibration is running.
    pub adaptiq_timeout_secs: u32,

    // --- Low power ---
    /// How many intents low-power standby remembers for replay on resume.
    pub intent_cache_depth: usize,

    // --- Logging ---
    pub dprint: DPrintSettings,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            product_name: "productctl".into(),
            first_boot_greeting: false,
            force_setup: false,
            volume_threshold: 70,
            default_volume: 30,
            adaptiq_timeout_secs: 600,
            intent_cache_depth: 4,
            dprint: DPrintSettings::default(),
        }
    }
}

impl ControllerConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Reject out-of-range values rather than clamping them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.volume_threshold > 100 {
            return Err(ConfigError::ValidationFailed("volume_threshold must be <= 100"));
        }
        if self.default_volume > 100 {
            return Err(ConfigError::ValidationFailed("default_volume must be <= 100"));
        }
        if self.adaptiq_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed("adaptiq_timeout_secs must be > 0"));
        }
        if self.intent_cache_depth == 0 || self.intent_cache_depth > MAX_INTENT_CACHE_DEPTH {
            return Err(ConfigError::ValidationFailed(
                "intent_cache_depth must be between 1 and 8",
            ));
        }
        if self.dprint.env_var.is_empty() {
            return Err(ConfigError::ValidationFailed("dprint.env_var must not be empty"));
        }
        Ok(())
    }
}

/// Settings for the DPrint engine that are fixed at startup.  Runtime
/// verbosity is driven by the `BOSE_DPRINT_CONF` grammar instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DPrintSettings {
    /// Environment variable holding inline config text or a config path.
    pub env_var: String,
    /// Config files tried in order when the variable is unset.  A hit under
    /// `media_mount` also switches output to a file on that mount.
    pub search_paths: Vec<String>,
    /// Removable-media mount that receives file output.
    pub media_mount: String,
    /// Datagram socket of the system logger.
    pub syslog_socket: String,
    /// Level given to facilities no pattern matches.
    pub default_level: LogLevel,
    /// Whether facilities no pattern matches start enabled.
    pub enabled_by_default: bool,
}

impl Default for DPrintSettings {
    fn default() -> Self {
        Self {
            env_var: "BOSE_DPRINT_CONF".into(),
            search_paths: vec![
                "/media/sda1/dprint.conf".into(),
                "/etc/opt/Bose/dprint.conf".into(),
            ],
            media_mount: "/media/sda1".into(),
            syslog_socket: "/dev/log".into(),
            default_level: LogLevel::Info,
            enabled_by_default: true,
        }
    }
}
