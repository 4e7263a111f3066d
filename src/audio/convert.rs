// Frame format conversion for capture backends
//
// Devices rarely deliver exactly the format the transcription service wants,
// so backends run every frame through `process_frame` before sending it on.

use super::backend::AudioFrame;

/// Convert a frame to the target rate and channel count
pub fn process_frame(frame: AudioFrame, target_sample_rate: u32, target_channels: u16) -> AudioFrame {
    let mut processed = frame;

    // Mix down first so decimation works on fewer samples
    if processed.channels != target_channels && target_channels == 1 {
        processed = to_mono(processed);
    }

    if processed.sample_rate != target_sample_rate {
        processed = downsample(processed, target_sample_rate);
    }

    processed
}

/// Downsample audio frame by decimation
///
/// Only integer ratios are exact; the reported rate is recomputed from the
/// ratio actually used.
pub fn downsample(frame: AudioFrame, target_rate: u32) -> AudioFrame {
    if frame.sample_rate <= target_rate || target_rate == 0 {
        return frame; // Can't upsample
    }

    let ratio = (frame.sample_rate / target_rate).max(1) as usize;
    if ratio == 1 {
        return frame;
    }

    let channels = frame.channels.max(1) as usize;
    let downsampled: Vec<i16> = frame
        .samples
        .chunks_exact(channels)
        .step_by(ratio)
        .flatten()
        .copied()
        .collect();

    AudioFrame {
        samples: downsampled,
        sample_rate: frame.sample_rate / ratio as u32,
        channels: frame.channels,
        timestamp_ms: frame.timestamp_ms,
    }
}

/// Average interleaved channels into one
pub fn to_mono(frame: AudioFrame) -> AudioFrame {
    if frame.channels <= 1 {
        return frame;
    }

    let channels = frame.channels as usize;
    let mono_samples: Vec<i16> = frame
        .samples
        .chunks_exact(channels)
        .map(|chunk| {
            let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect();

    AudioFrame {
        samples: mono_samples,
        sample_rate: frame.sample_rate,
        channels: 1,
        timestamp_ms: frame.timestamp_ms,
    }
}

/// Convert a float sample in [-1.0, 1.0] to 16-bit PCM
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
