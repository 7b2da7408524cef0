//! Structured JSON logger
//!
//! - One log line = one event
//! - `event` first, then `severity`, then fields sorted by key
//! - Synchronous, no buffering

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::Event;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-batch detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "info" => Ok(Severity::Info),
            "warn" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Shared in-memory log buffer, one entry per emitted line.
pub type LogBuffer = Arc<Mutex<Vec<String>>>;

/// Where log lines go.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stdout,
    Stderr,
    /// Captured lines, used by tests and embedding hosts
    Memory(LogBuffer),
    Disabled,
}

impl FromStr for LogTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdout" => Ok(LogTarget::Stdout),
            "stderr" => Ok(LogTarget::Stderr),
            "none" => Ok(LogTarget::Disabled),
            other => Err(format!("unknown log target '{}'", other)),
        }
    }
}

#[derive(Serialize)]
struct LogLine<'a> {
    event: &'a str,
    severity: &'a str,
    #[serde(flatten)]
    fields: BTreeMap<&'a str, &'a str>,
}

/// A structured logger that outputs JSON lines.
#[derive(Debug, Clone)]
pub struct Logger {
    min_severity: Severity,
    target: LogTarget,
}

impl Logger {
    /// Create a logger writing events at or above `min_severity` to `target`
    pub fn new(min_severity: Severity, target: LogTarget) -> Self {
        Self {
            min_severity,
            target,
        }
    }

    /// A logger that drops everything
    pub fn disabled() -> Self {
        Self::new(Severity::Fatal, LogTarget::Disabled)
    }

    /// A logger capturing every line (TRACE and up) into a fresh buffer
    pub fn memory() -> (Self, LogBuffer) {
        let buffer = LogBuffer::default();
        (
            Self::new(Severity::Trace, LogTarget::Memory(Arc::clone(&buffer))),
            buffer,
        )
    }

    /// Returns true if a line at `severity` would be emitted
    pub fn enabled(&self, severity: Severity) -> bool {
        !matches!(self.target, LogTarget::Disabled) && severity >= self.min_severity
    }

    /// Log an event with the given severity and fields
    pub fn log(&self, severity: Severity, event: Event, fields: &[(&str, &str)]) {
        if !self.enabled(severity) {
            return;
        }
        let line = render(severity, event, fields);
        match &self.target {
            LogTarget::Stdout => write_line(&mut io::stdout(), &line),
            LogTarget::Stderr => write_line(&mut io::stderr(), &line),
            LogTarget::Memory(buffer) => {
                if let Ok(mut lines) = buffer.lock() {
                    lines.push(line);
                }
            }
            LogTarget::Disabled => {}
        }
    }

    /// Log at TRACE level
    pub fn trace(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(Severity::Trace, event, fields);
    }

    /// Log at INFO level
    pub fn info(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level
    pub fn error(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(Severity::Error, event, fields);
    }

    /// Log at FATAL level
    pub fn fatal(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(Severity::Fatal, event, fields);
    }
}

fn render(severity: Severity, event: Event, fields: &[(&str, &str)]) -> String {
    let line = LogLine {
        event: event.as_str(),
        severity: severity.as_str(),
        fields: fields.iter().copied().collect(),
    };
    // A map of string pairs always serializes.
    serde_json::to_string(&line).unwrap_or_default()
}

fn write_line<W: Write>(writer: &mut W, line: &str) {
    let mut output = String::with_capacity(line.len() + 1);
    output.push_str(line);
    output.push('\n');
    // Write atomically (one syscall)
    let _ = writer.write_all(output.as_bytes());
    let _ = writer.flush();
}
