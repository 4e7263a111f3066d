//! Frequency-domain analysis of the live capture stream
//!
//! Keeps the most recent `fft_size` samples and turns them into byte-scaled
//! magnitudes per frequency bin, the way browser analyser nodes report them:
//! Blackman window, FFT, temporal smoothing, then decibels mapped onto 0..=255.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Configuration for the spectrum analyser
#[derive(Debug, Clone)]
pub struct AnalyserConfig {
    /// FFT window size; yields `fft_size / 2` frequency bins
    pub fft_size: usize,
    /// Temporal smoothing factor (0.0-1.0, higher = more smoothing)
    pub smoothing: f32,
    /// Magnitude mapped to byte value 0
    pub min_db: f32,
    /// Magnitude mapped to byte value 255
    pub max_db: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 32,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

pub struct SpectrumAnalyser {
    config: AnalyserConfig,
    window: Vec<f32>,
    history: VecDeque<f32>,
    smoothed: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl SpectrumAnalyser {
    pub fn new() -> Self {
        Self::with_config(AnalyserConfig::default())
    }

    pub fn with_config(config: AnalyserConfig) -> Self {
        let n = config.fft_size.max(2);

        // Blackman window
        let window = (0..n)
            .map(|i| {
                let x = 2.0 * std::f32::consts::PI * i as f32 / n as f32;
                0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
            })
            .collect();

        let fft = FftPlanner::new().plan_fft_forward(n);

        Self {
            window,
            history: VecDeque::from(vec![0.0; n]),
            smoothed: vec![0.0; n / 2],
            fft,
            config: AnalyserConfig { fft_size: n, ..config },
        }
    }

    /// Number of frequency bins reported by `byte_frequency_data`
    pub fn bin_count(&self) -> usize {
        self.config.fft_size / 2
    }

    /// Feed captured PCM samples; only the newest `fft_size` are kept
    pub fn push(&mut self, samples: &[i16]) {
        let n = self.config.fft_size;
        let skip = samples.len().saturating_sub(n);
        for &s in &samples[skip..] {
            if self.history.len() == n {
                self.history.pop_front();
            }
            self.history.push_back(s as f32 / 32768.0);
        }
    }

    /// Clear sample history and smoothing state
    pub fn reset(&mut self) {
        self.history.iter_mut().for_each(|s| *s = 0.0);
        self.smoothed.iter_mut().for_each(|m| *m = 0.0);
    }

    /// Compute the current spectrum as byte magnitudes (0..=255) per bin
    pub fn byte_frequency_data(&mut self) -> Vec<u8> {
        let n = self.config.fft_size;

        let mut buffer: Vec<Complex<f32>> = self
            .history
            .iter()
            .zip(self.window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();

        self.fft.process(&mut buffer);

        let tau = self.config.smoothing.clamp(0.0, 1.0);
        let range = self.config.max_db - self.config.min_db;

        buffer
            .iter()
            .take(n / 2)
            .zip(self.smoothed.iter_mut())
            .map(|(bin, prev)| {
                let magnitude = bin.norm() / n as f32;
                *prev = tau * *prev + (1.0 - tau) * magnitude;

                let db = if *prev > 0.0 {
                    20.0 * prev.log10()
                } else {
                    f32::NEG_INFINITY
                };

                let scaled = 255.0 * (db - self.config.min_db) / range;
                scaled.clamp(0.0, 255.0) as u8
            })
            .collect()
    }
}

impl Default for SpectrumAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared slot holding the analyser of one capture session
///
/// The capture pump feeds it and the level monitor samples it. Releasing the
/// handle drops the analyser; later pushes and samples become no-ops.
#[derive(Clone)]
pub struct AnalyserHandle(Arc<Mutex<Option<SpectrumAnalyser>>>);

impl AnalyserHandle {
    pub fn new(analyser: SpectrumAnalyser) -> Self {
        Self(Arc::new(Mutex::new(Some(analyser))))
    }

    pub fn push(&self, samples: &[i16]) {
        if let Some(analyser) = self.lock().as_mut() {
            analyser.push(samples);
        }
    }

    pub fn release(&self) {
        self.lock().take();
    }

    pub fn is_released(&self) -> bool {
        self.lock().is_none()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Option<SpectrumAnalyser>> {
        // A panic while holding the lock leaves plain numeric state behind
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
