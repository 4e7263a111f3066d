//! Press-and-hold voice input bound to one draft field
//!
//! [`VoiceInput`] is what a screen holds: it owns a controller and a
//! [`DraftSink`], turns gestures into start/stop calls, and converts every
//! failure into a [`Notice`] so the caller's existing text is never lost.

mod services;
mod sinks;

pub use services::VoiceServices;
pub use sinks::{ContactNotes, DraftSink, NewContactDraft, NoteDictation};

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::error::VoiceError;
use crate::permission::{PermissionState, PermissionTracker};
use crate::session::{
    CaptureArbiter, RecordingController, SessionOutcome, SessionState, StartOutcome,
};

/// Non-fatal problem to show next to the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PermissionDenied,
    DeviceUnavailable(String),
    TranscriptionFailed(String),
    /// Another input is recording
    Busy,
}

impl From<VoiceError> for Notice {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::PermissionDenied => Notice::PermissionDenied,
            VoiceError::DeviceUnavailable(reason) => Notice::DeviceUnavailable(reason),
            VoiceError::TranscriptionFailed(reason) | VoiceError::Encoding(reason) => {
                Notice::TranscriptionFailed(reason)
            }
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::PermissionDenied => write!(f, "Microphone access was not granted"),
            Notice::DeviceUnavailable(reason) => write!(f, "Microphone unavailable: {}", reason),
            Notice::TranscriptionFailed(reason) => write!(f, "Could not transcribe: {}", reason),
            Notice::Busy => write!(f, "Another recording is in progress"),
        }
    }
}

/// Snapshot for rendering the control
#[derive(Debug, Clone, PartialEq)]
pub struct InputStatus {
    pub recording: bool,
    /// Waiting on the transcription service
    pub busy: bool,
    /// Input level in [0, 100]
    pub level: f32,
    pub permission: PermissionState,
    pub notice: Option<Notice>,
}

pub struct VoiceInput<S: DraftSink> {
    controller: RecordingController,
    permissions: Arc<PermissionTracker>,
    arbiter: CaptureArbiter,
    sink: Mutex<S>,
    notice: Mutex<Option<Notice>>,
}

impl<S: DraftSink> VoiceInput<S> {
    pub fn new(services: &VoiceServices, sink: S) -> Self {
        let config = services.session_config(sink.label(), sink.handoff());

        Self {
            controller: services.controller(config),
            permissions: Arc::clone(&services.permissions),
            arbiter: services.arbiter.clone(),
            sink: Mutex::new(sink),
            notice: Mutex::new(None),
        }
    }

    /// Start gesture
    ///
    /// Prompts for permission when it is not granted yet, then starts
    /// recording. Returns whether recording started.
    pub async fn press(&self) -> bool {
        self.set_notice(None);

        if !self.ensure_permission().await {
            // An undecided prompt deferred by another capture is not a refusal
            let notice = if self.arbiter.is_busy() && self.permissions.status() != PermissionState::Denied {
                Notice::Busy
            } else {
                Notice::PermissionDenied
            };
            self.set_notice(Some(notice));
            return false;
        }

        match self.controller.start().await {
            Ok(StartOutcome::Started(_)) => true,
            Ok(StartOutcome::AlreadyActive) => false,
            Ok(StartOutcome::PermissionRequired(state)) => {
                debug!("[{}] Permission changed to {} before start", self.label(), state);
                self.set_notice(Some(Notice::PermissionDenied));
                false
            }
            Ok(StartOutcome::Busy) => {
                self.set_notice(Some(Notice::Busy));
                false
            }
            Err(e) => {
                warn!("[{}] Could not start recording: {}", self.label(), e);
                self.set_notice(Some(e.into()));
                false
            }
        }
    }

    /// End gesture
    ///
    /// Stops recording and merges any recognized result into the sink.
    /// Returns `None` when the handoff failed; the notice says why.
    pub async fn release(&self) -> Option<SessionOutcome> {
        match self.controller.stop().await {
            Ok(outcome) => {
                if outcome.is_recognized() && self.lock_sink().apply(&outcome) {
                    info!("[{}] Draft updated from voice", self.label());
                }
                Some(outcome)
            }
            Err(e) => {
                self.set_notice(Some(e.into()));
                None
            }
        }
    }

    /// Explicit permission prompt, e.g. from a settings row
    pub async fn request_permission(&self) -> PermissionState {
        let state = self.permissions.request_permission().await;
        if state.is_granted() {
            self.set_notice(None);
        }
        state
    }

    pub fn status(&self) -> InputStatus {
        let state = self.controller.state();

        InputStatus {
            recording: state == SessionState::Recording,
            busy: state == SessionState::Transcribing,
            level: self.controller.current_level(),
            permission: self.permissions.status(),
            notice: self.lock_notice().clone(),
        }
    }

    pub fn sink(&self) -> MutexGuard<'_, S> {
        self.lock_sink()
    }

    pub fn controller(&self) -> &RecordingController {
        &self.controller
    }

    /// Release the microphone when the owning screen goes away
    pub async fn shutdown(&self) {
        self.controller.shutdown().await;
    }

    fn label(&self) -> &str {
        self.controller.label()
    }

    async fn ensure_permission(&self) -> bool {
        if self.permissions.status().is_granted() {
            return true;
        }
        if self.permissions.check_status().await.is_granted() {
            return true;
        }
        self.permissions.request_permission().await.is_granted()
    }

    fn set_notice(&self, notice: Option<Notice>) {
        *self.lock_notice() = notice;
    }

    fn lock_notice(&self) -> MutexGuard<'_, Option<Notice>> {
        self.notice.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_sink(&self) -> MutexGuard<'_, S> {
        self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
