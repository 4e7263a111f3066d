// Tests for capture backend abstractions and the backend factory

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use yakyn_voice::audio::{
    AudioBackendConfig, AudioBackendFactory, AudioBackendProvider, AudioFrame, AudioSource,
};
use yakyn_voice::VoiceError;

#[test]
fn test_audio_frame_duration() {
    let frame = AudioFrame {
        samples: vec![0i16; 1600], // 100ms at 16kHz
        sample_rate: 16000,
        channels: 1,
        timestamp_ms: 0,
    };
    assert_eq!(frame.duration_ms(), 100);

    let stereo = AudioFrame {
        samples: vec![0i16; 9600], // 100ms at 48kHz, interleaved
        sample_rate: 48000,
        channels: 2,
        timestamp_ms: 0,
    };
    assert_eq!(stereo.duration_ms(), 100);
}

#[test]
fn test_audio_backend_config_default() {
    let config = AudioBackendConfig::default();

    assert_eq!(config.target_sample_rate, 16000, "Default should be 16kHz for speech");
    assert_eq!(config.target_channels, 1, "Default should be mono");
    assert_eq!(config.buffer_duration_ms, 100, "Default buffer should be 100ms");
}

#[test]
fn test_device_ids_identify_the_source() {
    let default_mic = AudioBackendFactory::new(AudioSource::Microphone(None));
    assert_eq!(default_mic.device_id(), "mic:default");

    let named = AudioBackendFactory::new(AudioSource::Microphone(Some("USB Mic".to_string())));
    assert_eq!(named.device_id(), "mic:USB Mic");

    let file = AudioBackendFactory::new(AudioSource::File(PathBuf::from("/tmp/memo.wav")));
    assert_eq!(file.device_id(), "file:/tmp/memo.wav");
}

#[cfg(not(feature = "microphone"))]
#[test]
fn test_microphone_requires_feature() {
    let factory = AudioBackendFactory::new(AudioSource::Microphone(None));
    let result = factory.create(&AudioBackendConfig::default());
    assert!(matches!(result, Err(VoiceError::DeviceUnavailable(_))));
}

#[tokio::test]
async fn test_missing_file_cannot_start() -> Result<()> {
    let factory = AudioBackendFactory::new(AudioSource::File(PathBuf::from("/nonexistent/memo.wav")));
    let mut backend = factory.create(&AudioBackendConfig::default())?;

    let result = backend.start().await;
    assert!(matches!(result, Err(VoiceError::DeviceUnavailable(_))));
    assert!(!backend.is_capturing());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_file_backend_streams_and_stops() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("memo.wav");
    write_tone(&path, 16000, 1, Duration::from_millis(500))?;

    let factory = AudioBackendFactory::new(AudioSource::File(path));
    let mut backend = factory.create(&AudioBackendConfig::default())?;
    let mut frames = backend.start().await?;
    assert!(backend.is_capturing());

    let mut received = Vec::new();
    for _ in 0..5 {
        received.push(frames.recv().await.expect("frame"));
    }
    assert!(received.iter().all(|f| f.sample_rate == 16000 && f.channels == 1));
    assert_eq!(received.iter().map(|f| f.samples.len()).sum::<usize>(), 8000);

    backend.stop().await?;
    assert!(!backend.is_capturing());
    assert!(frames.recv().await.is_none(), "stream should end after stop");

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_file_backend_converts_to_target_format() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("stereo.wav");
    write_tone(&path, 48000, 2, Duration::from_millis(100))?;

    let factory = AudioBackendFactory::new(AudioSource::File(path));
    let mut backend = factory.create(&AudioBackendConfig::default())?;
    let mut frames = backend.start().await?;

    let frame = frames.recv().await.expect("frame");
    assert_eq!(frame.sample_rate, 16000);
    assert_eq!(frame.channels, 1);
    assert_eq!(frame.samples.len(), 1600);

    backend.stop().await?;
    Ok(())
}

fn write_tone(path: &std::path::Path, sample_rate: u32, channels: u16, length: Duration) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    let frames = (sample_rate as u64 * length.as_millis() as u64 / 1000) as usize;
    for i in 0..frames {
        let value = if (i / 20) % 2 == 0 { 8000 } else { -8000 };
        for _ in 0..channels {
            writer.write_sample(value as i16)?;
        }
    }
    writer.finalize()?;
    Ok(())
}
