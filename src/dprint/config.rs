//! Parser for the DPrint configuration text.
//!
//! ```text
//!   # comment to end of line
//!   set stdout | syslog | datetime
//!   <facility | all | prefix*> <level | digit | off> [process-name]
//! ```
//!
//! Commands end at `;` or a newline.  Tokens are split on whitespace.  The
//! parser only produces commands and diagnostics; the registry applies them.

use std::path::Path;

use super::backend::OutputLocation;
use super::level::LogLevel;

/// One recognised configuration command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// `set stdout` / `set syslog`.
    Output(OutputLocation),
    /// `set datetime`: wall-clock timestamps instead of monotonic ones.
    DateTime,
    /// Enable `facility` at `level`, or disable it when `level` is `None`.
    Facility {
        facility: String,
        level: Option<LogLevel>,
    },
}

/// A command together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLine {
    pub line: usize,
    pub command: ConfigCommand,
}

/// Result of parsing one configuration source.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedConfig {
    pub commands: Vec<ConfigLine>,
    /// Problems found while parsing, already formatted for stderr.
    pub diagnostics: Vec<String>,
}

/// Where the configuration text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource<'a> {
    /// The environment variable value is the configuration itself.
    Inline(&'a str),
    /// The environment variable value names a file.
    File(&'a Path),
}

impl<'a> ConfigSource<'a> {
    /// Values starting with `/` or `.` name a file; anything else is
    /// configuration text.
    pub fn classify(value: &'a str) -> Self {
        if value.starts_with('/') || value.starts_with('.') {
            Self::File(Path::new(value))
        } else {
            Self::Inline(value)
        }
    }
}

/// Parse `text`.  `source` names the text in diagnostics; `exe` is the
/// running executable's name, matched against the optional process
/// argument.
pub fn parse(text: &str, source: &str, exe: &str) -> ParsedConfig {
    let mut out = ParsedConfig::default();
    for (idx, raw_line) in text.split('\n').enumerate() {
        let line = idx + 1;
        let code = match raw_line.find('#') {
            Some(pos) => &raw_line[..pos],
            None => raw_line,
        };
        for command in code.split(';') {
            let args: Vec<&str> = command.split_whitespace().collect();
            process_command(&args, source, line, exe, &mut out);
        }
    }
    out
}

fn process_command(args: &[&str], source: &str, line: usize, exe: &str, out: &mut ParsedConfig) {
    match args {
        [] => {}
        ["set", rest @ ..] => process_set(rest, source, line, out),
        [facility, level, process] => {
            if *process == exe {
                process_setting(facility, level, source, line, out);
            }
        }
        [facility, level] => process_setting(facility, level, source, line, out),
        [first, ..] => out
            .diagnostics
            .push(format!("{source}:{line}: Ignoring command |{first}|")),
    }
}

fn process_set(rest: &[&str], source: &str, line: usize, out: &mut ParsedConfig) {
    let command = match rest {
        ["stdout"] => ConfigCommand::Output(OutputLocation::Stdout),
        ["syslog"] => ConfigCommand::Output(OutputLocation::Syslog),
        ["datetime"] => ConfigCommand::DateTime,
        _ => {
            out.diagnostics
                .push(format!("Unknown 'set' command at {source} line {line}"));
            return;
        }
    };
    out.commands.push(ConfigLine { line, command });
}

fn process_setting(facility: &str, level: &str, source: &str, line: usize, out: &mut ParsedConfig) {
    if facility == "global" {
        out.diagnostics.push(format!(
            "{source}:{line}: \"global\" keyword is deprecated, ignored"
        ));
        return;
    }
    let level = if level == "off" {
        None
    } else {
        match LogLevel::from_config_token(level) {
            Some(l) => Some(l),
            None => {
                out.diagnostics
                    .push(format!("{source}:{line}: invalid level '{level}'"));
                return;
            }
        }
    };
    out.commands.push(ConfigLine {
        line,
        command: ConfigCommand::Facility {
            facility: facility.to_string(),
            level,
        },
    });
}
