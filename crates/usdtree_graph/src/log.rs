// SPDX-License-Identifier: MIT OR Apache-2.0
//! Logging interface handed to graph computation and viewport sync.
//!
//! Components receive a `&dyn Logger` instead of reaching for global state.
//! [`Log`] forwards to `tracing` with the component tag as a field;
//! [`LogOnce`] drops messages it has already emitted.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;

/// Severity of a log message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Debug
    Debug,
    /// Info
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
    /// Critical
    Critical,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        })
    }
}

/// Leveled, fire-and-forget log sink
pub trait Logger {
    /// Emit a message at `level`
    fn log(&self, level: LogLevel, message: &str);

    /// Emit a debug message
    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// Emit an info message
    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Emit a warning
    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    /// Emit an error
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    /// Emit a critical error
    fn critical(&self, message: &str) {
        self.log(LogLevel::Critical, message);
    }
}

/// Tagged logger backed by `tracing`
#[derive(Debug, Clone)]
pub struct Log {
    tag: String,
}

impl Log {
    /// Create a logger for the component `tag`
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// Component tag
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Logger for Log {
    fn log(&self, level: LogLevel, message: &str) {
        let tag = self.tag.as_str();
        match level {
            LogLevel::Debug => tracing::debug!(tag, "{message}"),
            LogLevel::Info => tracing::info!(tag, "{message}"),
            LogLevel::Warn => tracing::warn!(tag, "{message}"),
            LogLevel::Error => tracing::error!(tag, "{message}"),
            LogLevel::Critical => tracing::error!(tag, critical = true, "{message}"),
        }
    }
}

/// Logger that emits each distinct message only once, whatever its level
#[derive(Debug)]
pub struct LogOnce<L = Log> {
    inner: L,
    seen: Mutex<HashSet<String>>,
}

impl<L: Logger> LogOnce<L> {
    /// Wrap `inner`
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Forget every message seen so far
    pub fn reset(&self) {
        self.seen.lock().clear();
    }
}

impl LogOnce<Log> {
    /// Deduplicating `tracing` logger for the component `tag`
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self::new(Log::new(tag))
    }
}

impl<L: Logger> Logger for LogOnce<L> {
    fn log(&self, level: LogLevel, message: &str) {
        if self.seen.lock().insert(message.to_string()) {
            self.inner.log(level, message);
        }
    }
}
