//! The facility table and its administrative operations.
//!
//! ```text
//!  index  name          refs  enabled  level
//!  0      *UNKNOWN*     1     on       INSANE   (reserved)
//!  1      Alpha         2     on       DEBUG
//!  2      <free>                                 (reused by the next registration)
//!  3      ProductCtl    1     off      INFO
//! ```
//!
//! The table and the output backend sit behind separate locks so that
//! formatting and I/O never hold the table lock.  Configuration is loaded
//! at most once, on the first [`LoggerRegistry::is_log`] or
//! [`LoggerRegistry::initialize`] call.

use core::fmt;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use parking_lot::{Mutex, Once};

use crate::config::DPrintSettings;
use crate::error::DPrintError;

use super::backend::{Output, OutputLocation, render_message};
use super::config::{self as conf, ConfigCommand, ConfigSource, ParsedConfig};
use super::level::LogLevel;

/// Maximum number of facilities, the reserved index 0 included.
pub const MAX_FACILITIES: usize = 1024;

/// Name of the reserved facility at index 0.
pub const UNKNOWN_FACILITY: &str = "*UNKNOWN*";

/// Small-integer handle of a registered facility.
pub type FacilityId = usize;

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Facility {
    name: String,
    refs: u32,
    enabled: bool,
    level: LogLevel,
}

/// `prefix*` pattern: compares the first `len - 1` characters
/// case-insensitively, so `*` alone matches every name.
fn matches_pattern(pattern: &str, name: &str) -> bool {
    let prefix = &pattern[..pattern.len().saturating_sub(1)];
    name.len() >= prefix.len()
        && name.is_char_boundary(prefix.len())
        && name[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn is_pattern(name: &str) -> bool {
    name.ends_with('*')
}

/// A remembered rule is either a `prefix*` pattern or an exact name.
fn rule_matches(rule: &str, name: &str) -> bool {
    if is_pattern(rule) {
        matches_pattern(rule, name)
    } else {
        rule == name
    }
}

struct FacilityTable {
    slots: Vec<Option<Facility>>,
    by_name: HashMap<String, FacilityId>,
    /// Names that were registered once and have since been released.
    released: HashSet<String>,
    /// Remembered patterns and exact names, oldest first.  The last match
    /// wins when a facility registers.
    enable_rules: Vec<(String, bool)>,
    level_rules: Vec<(String, LogLevel)>,
    default_enabled: bool,
    default_level: LogLevel,
}

impl FacilityTable {
    fn new(default_enabled: bool, default_level: LogLevel) -> Self {
        let unknown = Facility {
            name: UNKNOWN_FACILITY.to_string(),
            refs: 1,
            enabled: true,
            level: LogLevel::Insane,
        };
        let mut by_name = HashMap::new();
        by_name.insert(UNKNOWN_FACILITY.to_string(), 0);
        Self {
            slots: vec![Some(unknown)],
            by_name,
            released: HashSet::new(),
            enable_rules: Vec::new(),
            level_rules: Vec::new(),
            default_enabled,
            default_level,
        }
    }

    fn register(&mut self, name: &str) -> FacilityId {
        if let Some(&id) = self.by_name.get(name) {
            if let Some(f) = self.slots[id].as_mut() {
                f.refs += 1;
            }
            return id;
        }

        let enabled = self
            .enable_rules
            .iter()
            .rev()
            .find(|(r, _)| rule_matches(r, name))
            .map_or(self.default_enabled, |(_, e)| *e);
        let level = self
            .level_rules
            .iter()
            .rev()
            .find(|(r, _)| rule_matches(r, name))
            .map_or(self.default_level, |(_, l)| *l);
        let facility = Facility {
            name: name.to_string(),
            refs: 1,
            enabled,
            level,
        };

        let id = match self.slots.iter().position(Option::is_none) {
            Some(free) => {
                self.slots[free] = Some(facility);
                free
            }
            None => {
                if self.slots.len() >= MAX_FACILITIES {
                    eprintln!("dprint: facility table full registering '{name}'");
                    panic!("DPrint facility table full ({MAX_FACILITIES} facilities)");
                }
                self.slots.push(Some(facility));
                self.slots.len() - 1
            }
        };
        self.released.remove(name);
        self.by_name.insert(name.to_string(), id);
        id
    }

    fn retain(&mut self, id: FacilityId) {
        match self.slots.get_mut(id).and_then(Option::as_mut) {
            Some(f) => f.refs += 1,
            None => panic!("DPrint retain of unregistered facility index {id}"),
        }
    }

    fn release(&mut self, id: FacilityId) {
        let Some(Some(f)) = self.slots.get_mut(id) else {
            return;
        };
        f.refs = f.refs.saturating_sub(1);
        if f.refs > 0 || id == 0 {
            return;
        }
        if let Some(f) = self.slots[id].take() {
            self.by_name.remove(&f.name);
            self.released.insert(f.name);
        }
    }

    fn get(&self, id: FacilityId) -> Option<&Facility> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    fn user_facilities_mut(&mut self) -> impl Iterator<Item = &mut Facility> {
        self.slots.iter_mut().skip(1).flatten()
    }

    fn remember<T>(rules: &mut Vec<(String, T)>, rule: &str, value: T) {
        rules.retain(|(r, _)| r != rule);
        rules.push((rule.to_string(), value));
    }

    /// Resolve an exact name for an administrative change, re-registering
    /// names that were released earlier.  The re-registration reference is
    /// owned by the table.
    fn resolve_exact(&mut self, name: &str) -> Option<FacilityId> {
        if let Some(&id) = self.by_name.get(name) {
            return Some(id);
        }
        if self.released.contains(name) {
            return Some(self.register(name));
        }
        None
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        if name.is_empty() {
            return false;
        }
        if name == "all" {
            self.set_enabled_all(enabled);
            return true;
        }
        if is_pattern(name) {
            let mut any = false;
            for f in self.user_facilities_mut() {
                if matches_pattern(name, &f.name) {
                    f.enabled = enabled;
                    any = true;
                }
            }
            Self::remember(&mut self.enable_rules, name, enabled);
            return any;
        }
        if name != UNKNOWN_FACILITY {
            Self::remember(&mut self.enable_rules, name, enabled);
        }
        match self.resolve_exact(name) {
            Some(0) => true,
            Some(id) => {
                if let Some(f) = self.slots[id].as_mut() {
                    f.enabled = enabled;
                }
                true
            }
            None => false,
        }
    }

    fn set_level(&mut self, name: &str, level: LogLevel) -> bool {
        if name.is_empty() {
            return false;
        }
        if name == "all" {
            self.set_global_level(level);
            return true;
        }
        if is_pattern(name) {
            let mut any = false;
            for f in self.user_facilities_mut() {
                if matches_pattern(name, &f.name) {
                    f.level = level;
                    any = true;
                }
            }
            Self::remember(&mut self.level_rules, name, level);
            return any;
        }
        if name != UNKNOWN_FACILITY {
            Self::remember(&mut self.level_rules, name, level);
        }
        match self.resolve_exact(name) {
            Some(0) => true,
            Some(id) => {
                if let Some(f) = self.slots[id].as_mut() {
                    f.level = level;
                }
                true
            }
            None => false,
        }
    }

    fn set_enabled_all(&mut self, enabled: bool) {
        self.enable_rules.clear();
        self.default_enabled = enabled;
        for f in self.user_facilities_mut() {
            f.enabled = enabled;
        }
    }

    fn set_global_level(&mut self, level: LogLevel) {
        self.level_rules.clear();
        self.default_level = level;
        for f in self.user_facilities_mut() {
            f.level = level;
        }
    }

    fn is_log(&self, id: FacilityId, level: LogLevel) -> bool {
        if id == 0 {
            return true;
        }
        self.get(id).is_some_and(|f| f.enabled && level <= f.level)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Process-wide (or test-local) logging state: facility table, remembered
/// patterns and the output backend.
pub struct LoggerRegistry {
    table: Mutex<FacilityTable>,
    output: Mutex<Output>,
    settings: DPrintSettings,
    configured: Once,
}

impl LoggerRegistry {
    pub fn new(settings: DPrintSettings) -> Self {
        Self {
            table: Mutex::new(FacilityTable::new(
                settings.enabled_by_default,
                settings.default_level,
            )),
            output: Mutex::new(Output::new(&settings)),
            settings,
            configured: Once::new(),
        }
    }

    pub fn settings(&self) -> &DPrintSettings {
        &self.settings
    }

    // ── Registration ──────────────────────────────────────────

    /// Register `name`, or take another reference on it if it is already
    /// registered.
    pub fn register(&self, name: &str) -> FacilityId {
        self.table.lock().register(name)
    }

    /// Take another reference on a registered facility.
    pub fn retain(&self, id: FacilityId) {
        self.table.lock().retain(id);
    }

    /// Drop one reference.  The slot is freed when the count reaches zero;
    /// index 0 is never freed.
    pub fn release(&self, id: FacilityId) {
        self.table.lock().release(id);
    }

    /// Facility id for `name`, registering it with a reference owned by the
    /// registry when it is not known yet.  Used by the `log` bridge.
    pub fn facility_for(&self, name: &str) -> FacilityId {
        let mut table = self.table.lock();
        match table.by_name.get(name) {
            Some(&id) => id,
            None => table.register(name),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<FacilityId> {
        self.table.lock().by_name.get(name).copied()
    }

    pub fn refcount(&self, id: FacilityId) -> u32 {
        self.table.lock().get(id).map_or(0, |f| f.refs)
    }

    pub fn facility_name(&self, id: FacilityId) -> Option<String> {
        self.table.lock().get(id).map(|f| f.name.clone())
    }

    /// `(enabled, level)` of a registered facility.
    pub fn facility_state(&self, id: FacilityId) -> Option<(bool, LogLevel)> {
        self.table.lock().get(id).map(|f| (f.enabled, f.level))
    }

    /// Number of registered facilities, index 0 included.
    pub fn facility_count(&self) -> usize {
        self.table.lock().by_name.len()
    }

    // ── Filtering and output ──────────────────────────────────

    /// True when `id` is enabled and `level` is at or below its configured
    /// level.  Index 0 always logs.
    pub fn is_log(&self, id: FacilityId, level: LogLevel) -> bool {
        self.ensure_configured();
        self.table.lock().is_log(id, level)
    }

    /// Emit a message without consulting the filter.
    pub fn log(&self, id: FacilityId, level: LogLevel, args: fmt::Arguments<'_>) {
        let Some(name) = self.facility_name(id) else {
            return;
        };
        let message = render_message(args);
        self.output.lock().write(level, &name, &message);
    }

    // ── Administration ────────────────────────────────────────

    /// Enable or disable an exact name, `all` or a `prefix*` pattern.
    ///
    /// Exact names return false when never registered.  Patterns return
    /// whether any registered facility matched.  Both are remembered and
    /// applied to facilities that register later.
    pub fn set_facility_enabled(&self, name: &str, enabled: bool) -> bool {
        self.table.lock().set_enabled(name, enabled)
    }

    /// Set the level of an exact name, `all` or a `prefix*` pattern.  Same
    /// return rules as [`set_facility_enabled`](Self::set_facility_enabled).
    pub fn set_facility_log_level(&self, name: &str, level: LogLevel) -> bool {
        self.table.lock().set_level(name, level)
    }

    /// Enable or disable every facility and the default for new ones.
    pub fn set_enabled_all(&self, enabled: bool) {
        self.table.lock().set_enabled_all(enabled);
    }

    /// Set every facility's level and the default for new ones.
    pub fn set_global_log_level(&self, level: LogLevel) {
        self.table.lock().set_global_level(level);
    }

    /// Enable `name` at `level`, or disable it for `None`.  This is what a
    /// `<facility> <level|off>` configuration line does.
    pub fn apply_setting(&self, name: &str, level: Option<LogLevel>) -> bool {
        let mut table = self.table.lock();
        match level {
            None => table.set_enabled(name, false),
            Some(level) => {
                let enabled = table.set_enabled(name, true);
                let leveled = table.set_level(name, level);
                enabled && leveled
            }
        }
    }

    /// Diagnostic table of every registered facility, sorted by name,
    /// followed by the level list and usage examples.
    pub fn current_logging_status(&self) -> Vec<String> {
        let mut rows: BTreeMap<String, (bool, LogLevel)> = BTreeMap::new();
        {
            let table = self.table.lock();
            for f in table.slots.iter().flatten() {
                rows.insert(f.name.clone(), (f.enabled, f.level));
            }
        }

        let mut out = vec![
            "                                Facility      Enabled State     Log Level".to_string(),
            "-".repeat(73),
        ];
        for (name, (enabled, level)) in rows {
            out.push(format!(
                "{name:>40}          {}               {}",
                if enabled { " on" } else { "off" },
                level as u8
            ));
        }
        out.push(String::new());
        out.push(String::new());
        out.push("Log levels to choose from (larger values yield more output):".to_string());
        for level in LogLevel::ALL {
            out.push(format!("{:>10} ({})", level.name(), level as u8));
        }
        out.push(String::new());
        out.push("Examples:".to_string());
        out.extend(
            [
                "          loglevel 2             (sets log level to WARN)",
                "          loglevel cli off       (disable logging for CLI)",
                "          loglevel startup on    (enable logging for STARTUP)",
                "          loglevel EVENTS on 3   (enable INFO logging for EVENTS)",
                "          loglevel all off       (disable logging for all facilities)",
            ]
            .map(String::from),
        );
        out
    }

    // ── Backend ───────────────────────────────────────────────

    pub fn output_location(&self) -> OutputLocation {
        self.output.lock().location()
    }

    pub fn set_output_location(&self, location: OutputLocation) -> Result<(), DPrintError> {
        self.output.lock().set_location(location)
    }

    pub fn set_print_to_stdout(&self, stdout: bool) {
        let location = if stdout {
            OutputLocation::Stdout
        } else {
            OutputLocation::Syslog
        };
        // Neither target opens a file, so this cannot fail.
        let _ = self.set_output_location(location);
    }

    pub fn set_datetime(&self, on: bool) {
        self.output.lock().set_datetime(on);
    }

    /// Path of the active log file, if file output was ever selected.
    pub fn log_file_path(&self) -> Option<std::path::PathBuf> {
        self.output.lock().file_path().map(Path::to_path_buf)
    }

    // ── Configuration ─────────────────────────────────────────

    /// Set the identity used by every backend and load the configuration.
    pub fn initialize(&self, app_name: &str) {
        self.output.lock().initialize(app_name);
        self.ensure_configured();
    }

    /// Load the configuration unless it has been loaded already.
    pub fn ensure_configured(&self) {
        self.configured.call_once(|| self.load_configuration());
    }

    /// Mark the configuration as loaded without reading the environment or
    /// the search paths.  For callers that configure the registry
    /// themselves.
    pub fn skip_configuration(&self) {
        self.configured.call_once(|| {});
    }

    fn load_configuration(&self) {
        if let Ok(value) = std::env::var(&self.settings.env_var) {
            self.load_config_value(&value, &self.settings.env_var);
            return;
        }
        for candidate in &self.settings.search_paths {
            let path = Path::new(candidate);
            if !path.exists() {
                continue;
            }
            if path.starts_with(&self.settings.media_mount) {
                if let Err(e) = self.set_output_location(OutputLocation::File) {
                    eprintln!("dprint: {e}");
                }
            }
            self.load_config_file(path);
            return;
        }
    }

    /// Apply an environment-style value: a path when it starts with `/` or
    /// `.`, inline configuration text otherwise.
    pub fn load_config_value(&self, value: &str, source: &str) {
        match ConfigSource::classify(value) {
            ConfigSource::File(path) => self.load_config_file(path),
            ConfigSource::Inline(text) => self.apply_config_text(text, source),
        }
    }

    /// Apply a configuration file.  A missing file is silently ignored.
    pub fn load_config_file(&self, path: &Path) {
        if let Ok(text) = std::fs::read_to_string(path) {
            self.apply_config_text(&text, &path.to_string_lossy());
        }
    }

    /// Parse and apply configuration text.  Problems are reported on
    /// stderr and the offending command skipped.
    pub fn apply_config_text(&self, text: &str, source: &str) {
        let (exe, app) = {
            let output = self.output.lock();
            (output.exe().to_string(), output.app_name().to_string())
        };
        let ParsedConfig {
            commands,
            diagnostics,
        } = conf::parse(text, source, &exe);
        for diagnostic in diagnostics {
            eprintln!("{diagnostic}");
        }
        for line in commands {
            match line.command {
                ConfigCommand::Output(location) => {
                    println!("{app}Logging to {location} at {source} line {}", line.line);
                    if let Err(e) = self.set_output_location(location) {
                        eprintln!("{source}:{}: {e}", line.line);
                    }
                }
                ConfigCommand::DateTime => {
                    println!(
                        "{app}Use date-time format for timestamps at {source} line {}",
                        line.line
                    );
                    self.set_datetime(true);
                }
                ConfigCommand::Facility { facility, level } => {
                    self.apply_setting(&facility, level);
                }
            }
        }
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new(DPrintSettings::default())
    }
}

impl fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("facilities", &self.facility_count())
            .field("output", &self.output_location())
            .finish()
    }
}
