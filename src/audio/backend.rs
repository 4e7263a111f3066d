use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::error::VoiceResult;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Playback length of this frame in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        let per_channel = self.samples.len() as u64 / self.channels as u64;
        per_channel * 1000 / self.sample_rate as u64
    }
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Target sample rate (will resample if needed)
    pub target_sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub target_channels: u16,
    /// Buffer size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // speech models expect 16kHz
            target_channels: 1,        // Mono
            buffer_duration_ms: 100,   // 100ms buffers
        }
    }
}

/// Audio capture backend trait
///
/// A backend owns one open input stream between `start` and `stop`. Frames
/// arrive on the returned channel; the channel closes once the backend stops.
///
/// Implementations:
/// - Microphone: cpal input stream (`microphone` feature)
/// - File: plays a WAV file back as if it were live input
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Open the input stream and begin delivering frames
    async fn start(&mut self) -> VoiceResult<mpsc::Receiver<AudioFrame>>;

    /// Close the input stream; a no-op when not capturing
    async fn stop(&mut self) -> VoiceResult<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Creates fresh backends for each capture session and permission probe
pub trait AudioBackendProvider: Send + Sync {
    fn create(&self, config: &AudioBackendConfig) -> VoiceResult<Box<dyn AudioBackend>>;

    /// Stable identifier of the underlying device, used to key cached permission decisions
    fn device_id(&self) -> String;
}

/// Audio source type
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// System input device, optionally selected by name
    Microphone(Option<String>),
    /// WAV file played back in real time (for testing/batch processing)
    File(PathBuf),
}

/// Audio backend factory for the sources this crate ships
#[derive(Debug, Clone)]
pub struct AudioBackendFactory {
    source: AudioSource,
}

impl AudioBackendFactory {
    pub fn new(source: AudioSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &AudioSource {
        &self.source
    }
}

impl AudioBackendProvider for AudioBackendFactory {
    fn create(&self, config: &AudioBackendConfig) -> VoiceResult<Box<dyn AudioBackend>> {
        match &self.source {
            AudioSource::Microphone(device) => {
                #[cfg(feature = "microphone")]
                {
                    use super::microphone::CpalBackend;
                    Ok(Box::new(CpalBackend::new(device.clone(), config.clone())))
                }

                #[cfg(not(feature = "microphone"))]
                {
                    let _ = (device, config);
                    Err(crate::error::VoiceError::DeviceUnavailable(
                        "built without microphone support (enable the `microphone` feature)"
                            .to_string(),
                    ))
                }
            }

            AudioSource::File(path) => {
                use super::file::FileBackend;
                Ok(Box::new(FileBackend::new(path.clone(), config.clone())))
            }
        }
    }

    fn device_id(&self) -> String {
        match &self.source {
            AudioSource::Microphone(Some(name)) => format!("mic:{}", name),
            AudioSource::Microphone(None) => "mic:default".to_string(),
            AudioSource::File(path) => format!("file:{}", path.display()),
        }
    }
}
