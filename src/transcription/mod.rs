//! Handoff of finished recordings to the transcription service

pub mod client;
pub mod messages;

pub use client::ApiTranscriber;
pub use messages::{AudioPayload, TranscribeResponse, VoiceToContactResponse};

use crate::audio::RecordedAudio;
use crate::contact::ContactExtraction;
use crate::error::VoiceResult;

/// External service turning recorded speech into text or contact fields
///
/// Both calls are single-shot. An empty string or an extraction without a
/// name means nothing was recognized; that is not an error.
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Recognize free-form speech
    async fn transcribe(&self, audio: &RecordedAudio) -> VoiceResult<String>;

    /// Recognize a spoken new-contact description
    async fn extract_contact(&self, audio: &RecordedAudio) -> VoiceResult<ContactExtraction>;
}
