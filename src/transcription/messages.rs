use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contact::{ContactExtraction, Frequency};

/// Request body for both transcription endpoints
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioPayload {
    pub audio: String, // Base64-encoded container bytes
    pub mime_type: String,
}

/// Response from `/api/ai/transcribe`
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
    #[serde(default)]
    pub text: String,
}

/// Response from `/api/ai/voice-to-contact`
#[derive(Debug, Serialize, Deserialize)]
pub struct VoiceToContactResponse {
    #[serde(default)]
    pub contact: Option<ContactFields>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<String>,
}

impl VoiceToContactResponse {
    pub fn into_extraction(self) -> ContactExtraction {
        let recognized_text = self.text.unwrap_or_default();

        let Some(contact) = self.contact else {
            return ContactExtraction {
                recognized_text,
                ..Default::default()
            };
        };

        let frequency = contact.frequency.as_deref().and_then(|raw| {
            let parsed = Frequency::parse(raw);
            if parsed.is_none() {
                debug!("Ignoring unrecognized frequency from extraction: {:?}", raw);
            }
            parsed
        });

        ContactExtraction {
            name: contact.name.trim().to_string(),
            frequency,
            notes: non_blank(contact.notes),
            birthday: non_blank(contact.birthday),
            recognized_text,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
