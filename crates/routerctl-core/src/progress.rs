// ── Progress reporting ──
//
// A progress sink receives one short human-readable line per session step.
// Sinks may be called from a worker task; redispatching to a UI thread is
// the caller's job.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Local};

/// Receives progress messages.
pub trait Progress: Send + Sync {
    fn report(&self, message: &str);
}

impl<F> Progress for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message);
    }
}

/// Report through an optional sink.
pub(crate) fn report(progress: Option<&dyn Progress>, message: &str) {
    if let Some(sink) = progress {
        sink.report(message);
    }
}

/// One timestamped progress line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub text: String,
    pub time: DateTime<Local>,
}

impl LogEntry {
    pub fn new(text: impl Into<String>, time: DateTime<Local>) -> Self {
        Self {
            text: text.into(),
            time,
        }
    }

    /// Timestamp as `HH:MM:SS:ffff`.
    pub fn time_label(&self) -> String {
        let tenths_of_ms = self.time.timestamp_subsec_micros() / 100;
        format!("{}:{tenths_of_ms:04}", self.time.format("%H:%M:%S"))
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.time_label(), self.text)
    }
}

/// Progress sink that keeps every message with the time it arrived.
#[derive(Debug, Default)]
pub struct ProgressLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Message texts only, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.text.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Progress for ProgressLog {
    fn report(&self, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry::new(message, Local::now()));
    }
}
