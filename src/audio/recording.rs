use std::io::Cursor;
use std::time::Duration;

use base64::Engine;
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use super::backend::AudioFrame;
use crate::error::VoiceResult;

/// Container format sent to the transcription service
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// A finished recording, handed off exactly once after capture stops
#[derive(Debug, Clone)]
pub struct RecordedAudio {
    /// Capture session this audio belongs to
    pub session_id: Uuid,
    /// Captured frames in arrival order
    pub frames: Vec<AudioFrame>,
    /// Wall-clock time between start and stop
    pub elapsed: Duration,
    /// When recording began
    pub recorded_at: DateTime<Utc>,
}

impl RecordedAudio {
    pub fn is_empty(&self) -> bool {
        self.frames.iter().all(|f| f.samples.is_empty())
    }

    pub fn sample_count(&self) -> usize {
        self.frames.iter().map(|f| f.samples.len()).sum()
    }

    /// Length of the captured audio itself (may trail `elapsed` slightly)
    pub fn audio_duration(&self) -> Duration {
        Duration::from_millis(self.frames.iter().map(AudioFrame::duration_ms).sum())
    }

    /// Encode all frames as a single 16-bit PCM WAV file in memory
    pub fn to_wav(&self) -> VoiceResult<Vec<u8>> {
        let (sample_rate, channels) = self
            .frames
            .first()
            .map(|f| (f.sample_rate, f.channels))
            .unwrap_or((16000, 1));

        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;

            for frame in &self.frames {
                if frame.sample_rate != sample_rate || frame.channels != channels {
                    warn!(
                        "Skipping frame at {}ms with mismatched format ({}Hz/{}ch, expected {}Hz/{}ch)",
                        frame.timestamp_ms, frame.sample_rate, frame.channels, sample_rate, channels
                    );
                    continue;
                }
                for &sample in &frame.samples {
                    writer.write_sample(sample)?;
                }
            }

            writer.finalize()?;
        }

        Ok(cursor.into_inner())
    }

    /// WAV bytes as standard base64, the form the transcription API accepts
    pub fn to_base64_wav(&self) -> VoiceResult<String> {
        Ok(base64::engine::general_purpose::STANDARD.encode(self.to_wav()?))
    }
}
