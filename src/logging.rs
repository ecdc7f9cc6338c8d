use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    pub timestamp_ms: u64,
    pub level: LogLevel,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<u64>,
    pub details: Value,
}

/// JSON-lines logger on stderr. stdout belongs to the referee protocol, so nothing
/// here ever writes there.
#[derive(Clone, Copy, Debug)]
pub struct Logger {
    min_level: LogLevel,
}

impl Logger {
    pub fn new(quiet: bool) -> Self {
        Self {
            min_level: if quiet { LogLevel::Warn } else { LogLevel::Debug },
        }
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn emit(&self, level: LogLevel, event: &str, turn: Option<u64>, details: Value) {
        if !self.enabled(level) {
            return;
        }
        let line = build_log_line(now_ms(), level, event, turn, details);
        if let Ok(text) = serde_json::to_string(&line) {
            eprintln!("{text}");
        }
    }

    pub fn info(&self, event: &str, turn: Option<u64>, details: Value) {
        self.emit(LogLevel::Info, event, turn, details);
    }

    pub fn debug(&self, event: &str, turn: Option<u64>, details: Value) {
        self.emit(LogLevel::Debug, event, turn, details);
    }

    pub fn warn(&self, event: &str, turn: Option<u64>, details: Value) {
        self.emit(LogLevel::Warn, event, turn, details);
    }

    pub fn error(&self, event: &str, turn: Option<u64>, details: Value) {
        self.emit(LogLevel::Error, event, turn, details);
    }
}

pub fn build_log_line(
    timestamp_ms: u64,
    level: LogLevel,
    event: &str,
    turn: Option<u64>,
    details: Value,
) -> StructuredLogLine {
    StructuredLogLine {
        timestamp_ms,
        level,
        event: event.to_string(),
        turn,
        details,
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
