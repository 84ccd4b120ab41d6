//! Buffered download status log

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

/// Outcome class of a log line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Transfer queued
    Queued,
    /// Transfer finished
    Finished,
    /// Transfer failed
    Failed,
}

/// One buffered status line
#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    /// When the line was recorded
    pub at: DateTime<Utc>,
    /// Outcome class
    pub kind: LogKind,
    /// Human-readable message
    pub message: String,
}

/// Status lines buffered while transfers run, written out on [`flush`](Self::flush)
///
/// Transfers finish while the operator prompt may be on screen, so lines are
/// held here until the last query has been handled.
#[derive(Debug, Default)]
pub struct DownloadLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl DownloadLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a status line
    pub fn record(&self, kind: LogKind, message: impl Into<String>) {
        let entry = LogEntry {
            at: Utc::now(),
            kind,
            message: message.into(),
        };
        self.lock().push(entry);
    }

    /// Number of buffered lines
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drain the buffer to the tracing log and return what was written
    pub fn flush(&self) -> Vec<LogEntry> {
        let drained = std::mem::take(&mut *self.lock());
        for entry in &drained {
            let at = entry.at.format("%H:%M:%S");
            match entry.kind {
                LogKind::Failed => tracing::warn!(at = %at, "{}", entry.message),
                LogKind::Queued | LogKind::Finished => {
                    tracing::info!(at = %at, "{}", entry.message)
                }
            }
        }
        drained
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
