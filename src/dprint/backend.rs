//! Output backends: syslog datagram socket, process stdout, or a log file
//! on removable media.
//!
//! ```text
//!  syslog  <134>app[42]: [(001234):Facility:INFO]message
//!  stdout  [000123.456 (001234):Facility:INFO]app[42]message
//!  file    same as stdout, appended to <media>/<exe>-YYYY-MM-DD_HH-MM-SS.uuuuuu.log
//! ```

use core::fmt::{self, Write as _};
use core::time::Duration;
use std::fs::{File, OpenOptions};
use std::io::{self, Write as _};
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use burster::Limiter;
use serde::{Deserialize, Serialize};

use crate::config::DPrintSettings;
use crate::error::DPrintError;

use super::level::LogLevel;

/// Largest message body, in bytes, including the truncation marker.
pub const MAX_MESSAGE_LEN: usize = 1023;

/// Marks a message cut at [`MAX_MESSAGE_LEN`].
pub const TRUNCATION_MARK: char = '$';

/// Longest syslog header kept before the message body.
const MAX_SYSLOG_HEADER_LEN: usize = 127;

/// syslog LOG_LOCAL0.
const LOG_LOCAL0: u8 = 16 << 3;

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLocation {
    #[default]
    Syslog,
    Stdout,
    /// Timestamped file under the removable-media mount.
    File,
}

impl fmt::Display for OutputLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Syslog => "syslog",
            Self::Stdout => "stdout",
            Self::File => "file",
        })
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format `args`, capping the result at [`MAX_MESSAGE_LEN`] bytes.  A capped
/// message ends in [`TRUNCATION_MARK`].
pub fn render_message(args: fmt::Arguments<'_>) -> String {
    let mut msg = String::new();
    // Writing into a String only fails if a Display impl reports an error.
    if msg.write_fmt(args).is_err() {
        return "*OOPS*".to_string();
    }
    if msg.len() > MAX_MESSAGE_LEN {
        let mut cut = MAX_MESSAGE_LEN - TRUNCATION_MARK.len_utf8();
        while !msg.is_char_boundary(cut) {
            cut -= 1;
        }
        msg.truncate(cut);
        msg.push(TRUNCATION_MARK);
    }
    msg
}

/// Kernel thread id of the caller.
pub fn thread_id() -> i64 {
    // SAFETY: gettid has no preconditions and cannot fail.
    i64::from(unsafe { libc::gettid() })
}

/// Seconds and milliseconds since boot, `%06u.%03u`.
pub fn monotonic_timestamp() -> String {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid, writable timespec.
    unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
    format!("{:06}.{:03}", ts.tv_sec as u64, ts.tv_nsec as u64 / 1_000_000)
}

/// Local wall-clock time, `MM/DD/YY hh:mm:ss`.
pub fn datetime_timestamp() -> String {
    // SAFETY: time accepts a null out-pointer; localtime_r writes only to
    // the zero-initialised `tm` we own.
    unsafe {
        let now = libc::time(core::ptr::null_mut());
        let mut tm: libc::tm = core::mem::zeroed();
        if libc::localtime_r(&now, &mut tm).is_null() {
            return "date-time unavailable".to_string();
        }
        format!(
            "{:02}/{:02}/{:02} {:02}:{:02}:{:02}",
            tm.tm_mon + 1,
            tm.tm_mday,
            tm.tm_year % 100,
            tm.tm_hour,
            tm.tm_min,
            tm.tm_sec
        )
    }
}

/// `[<timestamp> (<tid>):<facility>:<LEVEL>]`
pub fn format_prefix(timestamp: &str, tid: i64, facility: &str, level: LogLevel) -> String {
    format!("[{timestamp} ({tid:06}):{facility}:{level}]")
}

/// One stdout or file line, without the trailing newline.  A single
/// trailing newline in `message` is dropped.
pub fn format_line(prefix: &str, app_name: &str, message: &str) -> String {
    let message = message.strip_suffix('\n').unwrap_or(message);
    format!("{prefix}{app_name}{message}")
}

/// `<pri>identity[(tid):facility:LEVEL]`, capped at 127 bytes.
pub fn syslog_header(identity: &str, tid: i64, facility: &str, level: LogLevel) -> String {
    let mut header = format!(
        "<{}>{identity}[({tid:06}):{facility}:{level}]",
        level.syslog_priority() | LOG_LOCAL0
    );
    if header.len() > MAX_SYSLOG_HEADER_LEN {
        let mut cut = MAX_SYSLOG_HEADER_LEN;
        while !header.is_char_boundary(cut) {
            cut -= 1;
        }
        header.truncate(cut);
    }
    header
}

/// `<media>/<exe>-YYYY-MM-DD_HH-MM-SS.uuuuuu.log` for the UTC time `now`.
pub fn log_file_path(media_mount: &Path, exe: &str, now: SystemTime) -> PathBuf {
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = since_epoch.as_secs() as libc::time_t;
    // SAFETY: gmtime_r writes only to the zero-initialised `tm` we own.
    let stamp = unsafe {
        let mut tm: libc::tm = core::mem::zeroed();
        if libc::gmtime_r(&secs, &mut tm).is_null() {
            None
        } else {
            Some(format!(
                "-{}-{:02}-{:02}_{:02}-{:02}-{:02}.{:06}",
                tm.tm_year + 1900,
                tm.tm_mon + 1,
                tm.tm_mday,
                tm.tm_hour,
                tm.tm_min,
                tm.tm_sec,
                since_epoch.subsec_micros()
            ))
        }
    };
    media_mount.join(format!("{exe}{}.log", stamp.unwrap_or_default()))
}

/// Base name of the running executable.
pub fn exe_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn monotonic_now() -> Duration {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed()
}

// ---------------------------------------------------------------------------
// Syslog socket
// ---------------------------------------------------------------------------

/// Lazily connected datagram socket to the system logger.
///
/// Messages that cannot be sent are dropped and counted.  The next
/// successful connect sends a notice with the count first.
pub(crate) struct Syslog {
    path: PathBuf,
    identity: String,
    socket: Option<UnixDatagram>,
    dropped: u64,
    /// Limits stderr reports about connect failures.
    report_limiter: burster::TokenBucket<fn() -> Duration>,
}

impl Syslog {
    pub fn new(path: impl Into<PathBuf>, identity: String) -> Self {
        Self {
            path: path.into(),
            identity,
            socket: None,
            dropped: 0,
            report_limiter: burster::TokenBucket::new_with_time_provider(
                1,
                1, // one report per second
                monotonic_now as fn() -> Duration,
            ),
        }
    }

    pub fn set_identity(&mut self, identity: String) {
        self.identity = identity;
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    fn open(&mut self) -> bool {
        if self.socket.is_some() {
            return true;
        }
        let connected = UnixDatagram::unbound().and_then(|sock| {
            sock.connect(&self.path)?;
            sock.set_nonblocking(true)?;
            Ok(sock)
        });
        match connected {
            Ok(sock) => {
                self.socket = Some(sock);
                if self.dropped > 0 {
                    let dropped = core::mem::take(&mut self.dropped);
                    let notice = format!(
                        "Connected after dropping {dropped} log message{}",
                        if dropped == 1 { "" } else { "s" }
                    );
                    self.send_raw(LogLevel::Warning, "DPrint", &notice);
                }
                true
            }
            Err(e) => {
                if self.report_limiter.try_consume(1).is_ok() {
                    eprintln!("dprint: connect {}: {e}", self.path.display());
                }
                false
            }
        }
    }

    /// Send one message.  Never blocks.
    pub fn send(&mut self, level: LogLevel, facility: &str, message: &str) {
        if !self.open() {
            self.dropped += 1;
            return;
        }
        self.send_raw(level, facility, message);
    }

    fn send_raw(&mut self, level: LogLevel, facility: &str, message: &str) {
        let Some(sock) = &self.socket else {
            self.dropped += 1;
            return;
        };
        let mut datagram = syslog_header(&self.identity, thread_id(), facility, level);
        datagram.push_str(message);
        let sent = loop {
            match sock.send(datagram.as_bytes()) {
                Ok(_) => break Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => break Err(e),
            }
        };
        match sent {
            Ok(()) => {}
            // The logger is behind; the connection itself is fine.
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.dropped += 1;
                if self.report_limiter.try_consume(1).is_ok() {
                    eprintln!(
                        "dprint: {} busy, {} log message(s) dropped",
                        self.path.display(),
                        self.dropped
                    );
                }
            }
            Err(_) => {
                self.socket = None;
                self.dropped += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The selected backend plus everything the line format needs.
pub(crate) struct Output {
    location: OutputLocation,
    datetime: bool,
    /// `app[pid]`, written after the stdout/file prefix.
    app_name: String,
    exe: String,
    media_mount: PathBuf,
    file: Option<File>,
    file_path: Option<PathBuf>,
    syslog: Syslog,
}

impl Output {
    pub fn new(settings: &DPrintSettings) -> Self {
        let exe = exe_name();
        let identity = format!("{exe}[{}]: ", std::process::id());
        Self {
            location: OutputLocation::Syslog,
            datetime: false,
            app_name: String::new(),
            syslog: Syslog::new(&settings.syslog_socket, identity),
            media_mount: PathBuf::from(&settings.media_mount),
            exe,
            file: None,
            file_path: None,
        }
    }

    /// Adopt `app` as the identity used by every backend.
    pub fn initialize(&mut self, app: &str) {
        let pid = std::process::id();
        self.app_name = format!("{app}[{pid}]");
        self.syslog.set_identity(format!("{app}[{pid}]: "));
    }

    pub fn location(&self) -> OutputLocation {
        self.location
    }

    pub fn exe(&self) -> &str {
        &self.exe
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn syslog(&self) -> &Syslog {
        &self.syslog
    }

    pub fn set_datetime(&mut self, on: bool) {
        self.datetime = on;
    }

    /// Switch backend.  Selecting [`OutputLocation::File`] opens a fresh
    /// timestamped file; on failure the previous backend stays active.
    pub fn set_location(&mut self, location: OutputLocation) -> Result<(), DPrintError> {
        if location == OutputLocation::File {
            let path = log_file_path(&self.media_mount, &self.exe, SystemTime::now());
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| DPrintError::LogFile(format!("{}: {e}", path.display())))?;
            self.file = Some(file);
            self.file_path = Some(path);
        }
        self.location = location;
        Ok(())
    }

    pub fn write(&mut self, level: LogLevel, facility: &str, message: &str) {
        match self.location {
            OutputLocation::Syslog => self.syslog.send(level, facility, message),
            OutputLocation::Stdout => {
                let line = self.line(level, facility, message);
                let mut out = io::stdout().lock();
                let _ = writeln!(out, "{line}");
            }
            OutputLocation::File => {
                let line = self.line(level, facility, message);
                if let Some(file) = &mut self.file {
                    let _ = writeln!(file, "{line}");
                }
            }
        }
    }

    fn line(&self, level: LogLevel, facility: &str, message: &str) -> String {
        let timestamp = if self.datetime {
            datetime_timestamp()
        } else {
            monotonic_timestamp()
        };
        let prefix = format_prefix(&timestamp, thread_id(), facility, level);
        format_line(&prefix, &self.app_name, message)
    }
}
