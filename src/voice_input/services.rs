use std::sync::Arc;

use crate::audio::AudioBackendProvider;
use crate::config::VoiceConfig;
use crate::permission::PermissionTracker;
use crate::session::{CaptureArbiter, HandoffMode, RecordingController, SessionConfig};
use crate::transcription::Transcriber;

/// Collaborators shared by every voice input in the app
///
/// Built once at startup; each input gets its own controller from here.
#[derive(Clone)]
pub struct VoiceServices {
    pub permissions: Arc<PermissionTracker>,
    pub backends: Arc<dyn AudioBackendProvider>,
    pub transcriber: Arc<dyn Transcriber>,
    pub arbiter: CaptureArbiter,
    pub voice: VoiceConfig,
}

impl VoiceServices {
    pub fn new(
        permissions: Arc<PermissionTracker>,
        backends: Arc<dyn AudioBackendProvider>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            permissions,
            backends,
            transcriber,
            arbiter: CaptureArbiter::global(),
            voice: VoiceConfig::default(),
        }
    }

    pub fn with_arbiter(mut self, arbiter: CaptureArbiter) -> Self {
        self.arbiter = arbiter;
        self
    }

    pub fn with_voice_config(mut self, voice: VoiceConfig) -> Self {
        self.voice = voice;
        self
    }

    pub fn session_config(&self, label: &str, handoff: HandoffMode) -> SessionConfig {
        self.voice.session_config(label, handoff)
    }

    pub fn controller(&self, config: SessionConfig) -> RecordingController {
        RecordingController::new(
            config,
            Arc::clone(&self.backends),
            Arc::clone(&self.permissions),
            Arc::clone(&self.transcriber),
            self.arbiter.clone(),
        )
    }
}
