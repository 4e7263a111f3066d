use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::contact::ContactExtraction;
use crate::permission::PermissionState;

/// Lifecycle of a recording controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Transcribing,
}

/// Which transcription endpoint a finished recording is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffMode {
    /// Free-form text
    Transcript,
    /// Structured new-contact fields
    ContactDraft,
}

/// Result of a start gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Capture is live
    Started(Uuid),
    /// Already recording or transcribing; nothing changed
    AlreadyActive,
    /// Permission must be granted first; no stream was opened
    PermissionRequired(PermissionState),
    /// Another controller holds the microphone
    Busy,
}

/// Result of a stop gesture that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Nothing was recording
    NotRecording,
    /// Shorter than the minimum duration; no handoff was made
    Discarded { elapsed: Duration },
    /// The service heard nothing usable
    Empty,
    Transcript(String),
    Contact(ContactExtraction),
}

impl SessionOutcome {
    /// Whether the outcome carries a result for the caller
    pub fn is_recognized(&self) -> bool {
        matches!(self, SessionOutcome::Transcript(_) | SessionOutcome::Contact(_))
    }
}
