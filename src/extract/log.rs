//! Logging capability handed to the extraction core.

use std::sync::Mutex;
use tracing::{error, warn};

/// Sink for the warnings and errors the extractors emit.
pub trait EventLog {
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl EventLog for TracingLog {
    fn warn(&self, message: &str) {
        warn!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }
}

/// Severity of a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warn,
    Error,
}

/// Keeps events in memory so callers can inspect what happened.
#[derive(Debug, Default)]
pub struct MemoryLog {
    events: Mutex<Vec<(Level, String)>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<(Level, String)> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Messages at `level`.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.events().into_iter().filter(|(l, _)| *l == level).map(|(_, m)| m).collect()
    }

    fn push(&self, level: Level, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push((level, message.to_string()));
        }
    }
}

impl EventLog for MemoryLog {
    fn warn(&self, message: &str) {
        self.push(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }
}
