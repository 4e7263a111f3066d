pub mod analyser;
pub mod backend;
pub mod convert;
pub mod file;
pub mod level;
pub mod recording;

#[cfg(feature = "microphone")]
pub mod microphone;

pub use analyser::{AnalyserConfig, AnalyserHandle, SpectrumAnalyser};
pub use backend::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioBackendProvider, AudioFrame,
    AudioSource,
};
pub use file::{AudioFile, FileBackend};
pub use level::{level_from_bins, LevelMonitor, MAX_LEVEL};
pub use recording::{RecordedAudio, WAV_MIME_TYPE};
