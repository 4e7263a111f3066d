use std::time::Duration;

use crate::audio::AudioBackendConfig;

use super::state::HandoffMode;

/// Configuration for one recording controller
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Short name for logs (e.g., "note-dictation")
    pub label: String,

    /// Recordings shorter than this are discarded without a handoff
    /// Default: 500ms
    pub min_duration: Duration,

    /// How often the level monitor samples the analyser
    /// Default: 16ms (one display frame at 60Hz)
    pub level_interval: Duration,

    /// Format requested from the capture backend
    pub backend: AudioBackendConfig,

    /// Which transcription call a finished recording goes to
    pub handoff: HandoffMode,
}

impl SessionConfig {
    pub fn new(label: impl Into<String>, handoff: HandoffMode) -> Self {
        Self {
            label: label.into(),
            handoff,
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            label: "voice".to_string(),
            min_duration: Duration::from_millis(500),
            level_interval: crate::audio::level::DEFAULT_FRAME_INTERVAL,
            backend: AudioBackendConfig::default(),
            handoff: HandoffMode::Transcript,
        }
    }
}
