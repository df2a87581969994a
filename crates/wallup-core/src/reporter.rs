//! Log and progress reporting for upload jobs.
//!
//! The orchestrator writes timestamped, typed log lines and coarse progress
//! here; the presentation layer subscribes through an explicit event channel
//! (no ambient module state) to render a live console view.

use std::time::{SystemTime, UNIX_EPOCH};

/// Severity of a log entry, mirrored to the matching tracing level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Log,
    Error,
    Success,
    Warning,
    Info,
}

impl LogKind {
    pub fn icon(self) -> &'static str {
        match self {
            LogKind::Log => "•",
            LogKind::Error => "✖",
            LogKind::Success => "✔",
            LogKind::Warning => "⚠",
            LogKind::Info => "ℹ",
        }
    }
}

/// One line of the job's console log.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub message: String,
    pub kind: LogKind,
    /// Unix timestamp in milliseconds.
    pub time: i64,
}

impl LogEntry {
    pub fn icon(&self) -> &'static str {
        self.kind.icon()
    }
}

/// Observable per-job progress snapshot.
#[derive(Debug, Clone, Default)]
pub struct ProgressState {
    pub uploading: bool,
    /// Coarse percentage, monotonic within one attempt.
    pub progress: u8,
    /// Human label of the current step.
    pub status: String,
    pub error: Option<String>,
}

/// Event pushed to the UI subscriber.
#[derive(Debug, Clone)]
pub enum ReporterEvent {
    Log(LogEntry),
    Progress(ProgressState),
}

/// Event sink owned by one upload session.
///
/// Log history is append-only for the lifetime of a job: it survives retries
/// of the same attempt and is only reset when a fresh (non-retry) job starts,
/// so a retried job shows the original failure in full.
#[derive(Default)]
pub struct Reporter {
    entries: Vec<LogEntry>,
    progress: ProgressState,
    events: Option<tokio::sync::mpsc::UnboundedSender<ReporterEvent>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a UI subscriber. Replaces any previous subscriber.
    pub fn subscribe(&mut self) -> tokio::sync::mpsc::UnboundedReceiver<ReporterEvent> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    /// Append a timestamped entry and mirror it to tracing.
    pub fn append(&mut self, message: impl Into<String>, kind: LogKind) {
        let message = message.into();
        match kind {
            LogKind::Error => tracing::error!("{}", message),
            LogKind::Warning => tracing::warn!("{}", message),
            LogKind::Success | LogKind::Info | LogKind::Log => tracing::info!("{}", message),
        }
        let entry = LogEntry {
            message,
            kind,
            time: unix_millis(),
        };
        self.entries.push(entry.clone());
        self.emit(ReporterEvent::Log(entry));
    }

    /// Mark the start of an attempt.
    pub fn begin(&mut self) {
        self.progress = ProgressState {
            uploading: true,
            progress: 0,
            status: "Starting".to_string(),
            error: None,
        };
        self.emit_progress();
    }

    /// Advance coarse progress with a new step label.
    pub fn set_progress(&mut self, percent: u8, status: impl Into<String>) {
        self.progress.progress = percent.min(100);
        self.progress.status = status.into();
        self.emit_progress();
    }

    /// Terminal failure: uploading stops and the error message is surfaced.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.append(message.clone(), LogKind::Error);
        self.progress.uploading = false;
        self.progress.error = Some(message);
        self.emit_progress();
    }

    /// Terminal success.
    pub fn complete(&mut self) {
        self.progress.uploading = false;
        self.progress.progress = 100;
        self.progress.status = "Complete".to_string();
        self.progress.error = None;
        self.emit_progress();
    }

    /// Reset log and progress for a fresh, non-retry attempt (or a cancel).
    pub fn reset(&mut self) {
        self.entries.clear();
        self.progress = ProgressState::default();
        self.emit_progress();
    }

    fn emit_progress(&mut self) {
        let snapshot = self.progress.clone();
        self.emit(ReporterEvent::Progress(snapshot));
    }

    fn emit(&mut self, event: ReporterEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means the UI went away.
            if tx.send(event).is_err() {
                self.events = None;
            }
        }
    }
}

fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
