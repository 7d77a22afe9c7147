//! User-visible evaluation trace
//!
//! Every line ends up in the `schema:comment` of the result, so the log is
//! append-only and ordered.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Failure,
    Success,
}

impl LogLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO:",
            LogLevel::Warn => "WARN:",
            LogLevel::Failure => "FAILURE:",
            LogLevel::Success => "SUCCESS:",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.level.prefix(),
            self.timestamp.format("%Y-%m-%dT%H:%M:%S"),
            self.message
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct EvaluationLog {
    entries: Vec<LogEntry>,
}

impl EvaluationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(level = ?level, "{}", message);
        self.entries.push(LogEntry {
            level,
            timestamp: Local::now(),
            message,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Formatted lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// All lines separated by a blank line
    pub fn joined(&self) -> String {
        self.lines().join("\n\n")
    }
}
