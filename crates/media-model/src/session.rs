//! Recording session lifecycle.

use chrono::{DateTime, Utc};
use clipdeck_common::error::{ClipdeckError, ClipdeckResult};
use serde::{Deserialize, Serialize};

/// Status of a recording session.
///
/// Transitions run `Idle -> Recording -> Stopped`. `Failed` is the terminal
/// state reached when a running session aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Recording,
    Stopped,
    Failed,
}

/// Progress and lifecycle of one recording, owned by whoever started it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSession {
    status: SessionStatus,
    started_at: Option<DateTime<Utc>>,
    progress: f64,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            started_at: None,
            progress: 0.0,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_recording(&self) -> bool {
        self.status == SessionStatus::Recording
    }

    /// `Idle -> Recording`.
    pub fn begin(&mut self) -> ClipdeckResult<()> {
        if self.status != SessionStatus::Idle {
            return Err(ClipdeckError::session(format!(
                "Cannot start a session that is {:?}",
                self.status
            )));
        }
        self.status = SessionStatus::Recording;
        self.started_at = Some(Utc::now());
        self.progress = 0.0;
        Ok(())
    }

    /// Record progress; ignored unless recording.
    pub fn set_progress(&mut self, progress: f64) {
        if self.status == SessionStatus::Recording {
            self.progress = progress.clamp(0.0, 1.0);
        }
    }

    /// `Recording -> Stopped`. Returns false if the session was not recording.
    pub fn finish(&mut self) -> bool {
        if self.status != SessionStatus::Recording {
            return false;
        }
        self.status = SessionStatus::Stopped;
        self.progress = 1.0;
        true
    }

    /// `Recording -> Failed`. Returns false if the session was not recording.
    pub fn fail(&mut self) -> bool {
        if self.status != SessionStatus::Recording {
            return false;
        }
        self.status = SessionStatus::Failed;
        true
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}
