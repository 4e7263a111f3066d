use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::messages::{AudioPayload, ErrorResponse, TranscribeResponse, VoiceToContactResponse};
use super::Transcriber;
use crate::audio::{RecordedAudio, WAV_MIME_TYPE};
use crate::config::ApiConfig;
use crate::contact::ContactExtraction;
use crate::error::{VoiceError, VoiceResult};

pub const TRANSCRIBE_ENDPOINT: &str = "/api/ai/transcribe";
pub const VOICE_TO_CONTACT_ENDPOINT: &str = "/api/ai/voice-to-contact";

/// Transcription collaborator reached over the app's REST API
pub struct ApiTranscriber {
    http: reqwest::Client,
    base_url: String,
}

impl ApiTranscriber {
    pub fn new(config: &ApiConfig) -> VoiceResult<Self> {
        let mut headers = HeaderMap::new();

        if let Some(init_data) = config.init_data.as_deref().filter(|d| !d.is_empty()) {
            headers.insert(AUTHORIZATION, header_value(&format!("tma {}", init_data))?);
        } else if let Some(telegram_id) = config.dev_telegram_id.as_deref().filter(|d| !d.is_empty()) {
            headers.insert("X-Telegram-Id", header_value(telegram_id)?);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<Req, Resp>(&self, endpoint: &str, body: &Req) -> VoiceResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("POST {}", url);

        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| format!("Request failed: {}", status.as_u16()));
            return Err(VoiceError::TranscriptionFailed(message));
        }

        Ok(response.json::<Resp>().await?)
    }

    fn payload(audio: &RecordedAudio) -> VoiceResult<AudioPayload> {
        Ok(AudioPayload {
            audio: audio.to_base64_wav()?,
            mime_type: WAV_MIME_TYPE.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Transcriber for ApiTranscriber {
    async fn transcribe(&self, audio: &RecordedAudio) -> VoiceResult<String> {
        let payload = Self::payload(audio)?;
        info!(
            "Sending {:.1}s recording for transcription (session {})",
            audio.audio_duration().as_secs_f32(),
            audio.session_id
        );

        let response: TranscribeResponse = self.post(TRANSCRIBE_ENDPOINT, &payload).await?;
        Ok(response.text.trim().to_string())
    }

    async fn extract_contact(&self, audio: &RecordedAudio) -> VoiceResult<ContactExtraction> {
        let payload = Self::payload(audio)?;
        info!(
            "Sending {:.1}s recording for contact extraction (session {})",
            audio.audio_duration().as_secs_f32(),
            audio.session_id
        );

        let response: VoiceToContactResponse = self.post(VOICE_TO_CONTACT_ENDPOINT, &payload).await?;
        Ok(response.into_extraction())
    }
}

fn header_value(raw: &str) -> VoiceResult<HeaderValue> {
    HeaderValue::from_str(raw)
        .map_err(|e| VoiceError::TranscriptionFailed(format!("invalid auth header: {}", e)))
}
