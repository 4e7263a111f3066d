use std::path::{Path, PathBuf};
use std::time::Duration;

use hound::WavReader;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};
use super::convert::{f32_to_i16, process_frame};
use crate::error::{VoiceError, VoiceResult};

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> VoiceResult<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .map_err(|e| VoiceError::DeviceUnavailable(format!("{}: {}", path.display(), e)))?;

        let spec = reader.spec();
        let samples: Vec<i16> = match spec.sample_format {
            hound::SampleFormat::Int => reader
                .into_samples::<i16>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .map(|s| s.map(f32_to_i16))
                .collect::<Result<Vec<_>, _>>()?,
        };

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels.max(1) as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Split the file into frames of `frame_ms` each, timestamped from zero
    pub fn frames(&self, frame_ms: u64) -> Vec<AudioFrame> {
        let samples_per_frame =
            (self.sample_rate as u64 * frame_ms / 1000).max(1) as usize * self.channels.max(1) as usize;

        self.samples
            .chunks(samples_per_frame)
            .enumerate()
            .map(|(i, chunk)| AudioFrame {
                samples: chunk.to_vec(),
                sample_rate: self.sample_rate,
                channels: self.channels,
                timestamp_ms: i as u64 * frame_ms,
            })
            .collect()
    }
}

/// Plays a WAV file back through the capture pipeline at real-time pace
///
/// Once the file runs out the backend keeps the stream open and silent until
/// stopped, the same as a microphone in a quiet room.
pub struct FileBackend {
    path: PathBuf,
    config: AudioBackendConfig,
    task: Option<JoinHandle<()>>,
}

impl FileBackend {
    pub fn new(path: PathBuf, config: AudioBackendConfig) -> Self {
        Self {
            path,
            config,
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for FileBackend {
    async fn start(&mut self) -> VoiceResult<mpsc::Receiver<AudioFrame>> {
        if self.task.is_some() {
            return Err(VoiceError::DeviceUnavailable("already capturing".to_string()));
        }

        let file = AudioFile::open(&self.path)?;
        let frame_ms = self.config.buffer_duration_ms.max(1);
        let frames = file.frames(frame_ms);
        let target_rate = self.config.target_sample_rate;
        let target_channels = self.config.target_channels;

        let (tx, rx) = mpsc::channel(64);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(frame_ms));
            for frame in frames {
                ticker.tick().await;
                let frame = process_frame(frame, target_rate, target_channels);
                if tx.send(frame).await.is_err() {
                    return;
                }
            }
            debug!("File playback exhausted, holding stream open");
            tx.closed().await;
        });

        self.task = Some(task);
        info!("File capture started: {}", self.path.display());

        Ok(rx)
    }

    async fn stop(&mut self) -> VoiceResult<()> {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            info!("File capture stopped: {}", self.path.display());
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.is_some()
    }

    fn name(&self) -> &str {
        "WAV file playback"
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
