pub mod audio;
pub mod config;
pub mod contact;
pub mod error;
pub mod permission;
pub mod session;
pub mod transcription;
pub mod voice_input;

pub use audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioBackendProvider, AudioFile,
    AudioFrame, AudioSource, FileBackend, LevelMonitor, RecordedAudio,
};
pub use config::Config;
pub use contact::{ContactDraft, ContactExtraction, Frequency};
pub use error::{VoiceError, VoiceResult};
pub use permission::{PermissionQuery, PermissionState, PermissionStore, PermissionTracker};
pub use session::{
    CaptureArbiter, HandoffMode, RecordingController, SessionConfig, SessionOutcome, SessionState,
    StartOutcome,
};
pub use transcription::{ApiTranscriber, Transcriber};
pub use voice_input::{
    ContactNotes, DraftSink, InputStatus, NewContactDraft, NoteDictation, Notice, VoiceInput,
    VoiceServices,
};
