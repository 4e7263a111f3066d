use thiserror::Error;

/// Failures a capture session can report to its caller
///
/// Short recordings and empty transcriptions are not errors; they surface as
/// [`crate::session::SessionOutcome`] variants instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VoiceError {
    /// The user declined microphone access, now or earlier
    #[error("microphone permission denied")]
    PermissionDenied,

    /// The input device could not be opened for a reason other than permission
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The transcription service could not be reached or returned an error
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    /// The finished recording could not be packed into its container format
    #[error("failed to encode recording: {0}")]
    Encoding(String),
}

impl From<reqwest::Error> for VoiceError {
    fn from(err: reqwest::Error) -> Self {
        VoiceError::TranscriptionFailed(err.to_string())
    }
}

impl From<hound::Error> for VoiceError {
    fn from(err: hound::Error) -> Self {
        VoiceError::Encoding(err.to_string())
    }
}

pub type VoiceResult<T> = std::result::Result<T, VoiceError>;
