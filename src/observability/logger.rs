//! Structured JSON logger
//!
//! One log line = one event, emitted synchronously with no buffering.
//! Fields are sorted alphabetically so output is deterministic. Warnings
//! and errors go to stderr, everything else to stdout.
//!
//! Events emitted by this crate: `RECONCILE_NOOP`, `RECONCILE_APPLY`,
//! `MIGRATION_SKIP`, `MIGRATION_APPLY`, `MIGRATION_REVERT`.

use std::fmt;
use std::io::{self, Write};

/// Log levels, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Synchronous structured logger.
pub struct Logger;

impl Logger {
    pub fn log(level: LogLevel, event: &str, fields: &[(&str, &str)]) {
        if level >= LogLevel::Warn {
            Self::write_line(level, event, fields, &mut io::stderr());
        } else {
            Self::write_line(level, event, fields, &mut io::stdout());
        }
    }

    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(LogLevel::Trace, event, fields);
    }

    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(LogLevel::Info, event, fields);
    }

    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(LogLevel::Warn, event, fields);
    }

    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(LogLevel::Error, event, fields);
    }

    fn write_line<W: Write>(level: LogLevel, event: &str, fields: &[(&str, &str)], writer: &mut W) {
        let mut line = String::with_capacity(128);

        line.push_str("{\"event\":\"");
        escape_into(&mut line, event);
        line.push_str("\",\"level\":\"");
        line.push_str(level.as_str());
        line.push('"');

        let mut sorted: Vec<_> = fields.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);

        for (key, value) in sorted {
            line.push_str(",\"");
            escape_into(&mut line, key);
            line.push_str("\":\"");
            escape_into(&mut line, value);
            line.push('"');
        }

        line.push_str("}\n");

        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
}

fn escape_into(output: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c.is_control() => output.push_str(&format!("\\u{:04x}", c as u32)),
            c => output.push(c),
        }
    }
}
