// Live loudness feedback for the recording indicator
//
// While a session records, the monitor samples the analyser once per display
// frame and publishes a level in [0, 100]. The value is cosmetic only.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::analyser::AnalyserHandle;

/// Upper bound of the published level
pub const MAX_LEVEL: f32 = 100.0;

/// Low-frequency bins averaged into the level (bin 0 is DC and skipped)
const LEVEL_BINS: std::ops::RangeInclusive<usize> = 1..=5;

/// Boost so normal speech reaches the top of the range
const LEVEL_GAIN: f32 = 1.5;

/// Default sampling cadence, roughly one display frame at 60Hz
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Average the low bins of a byte spectrum into a level in [0, 100]
pub fn level_from_bins(bins: &[u8]) -> f32 {
    let band: Vec<f32> = bins
        .iter()
        .skip(*LEVEL_BINS.start())
        .take(LEVEL_BINS.end() - LEVEL_BINS.start() + 1)
        .map(|&b| b as f32)
        .collect();

    if band.is_empty() {
        return 0.0;
    }

    let avg = band.iter().sum::<f32>() / band.len() as f32;
    (avg / 255.0 * MAX_LEVEL * LEVEL_GAIN).clamp(0.0, MAX_LEVEL)
}

/// Samples an analyser on a frame-cadence loop and publishes the level
pub struct LevelMonitor {
    analyser: AnalyserHandle,
    levels: Arc<watch::Sender<f32>>,
    task: Option<JoinHandle<()>>,
}

impl LevelMonitor {
    /// Start the sampling loop (requires a tokio runtime)
    pub fn attach(analyser: AnalyserHandle, levels: Arc<watch::Sender<f32>>, interval: Duration) -> Self {
        let task = {
            let analyser = analyser.clone();
            let levels = Arc::clone(&levels);

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    ticker.tick().await;

                    // Publish under the analyser lock so a concurrent detach
                    // can never be followed by a stale non-zero level
                    let mut slot = analyser.lock();
                    let Some(spectrum) = slot.as_mut() else {
                        break;
                    };
                    let level = level_from_bins(&spectrum.byte_frequency_data());
                    levels.send_replace(level);
                }

                debug!("Level monitor loop finished");
            })
        };

        Self {
            analyser,
            levels,
            task: Some(task),
        }
    }

    /// Latest level, or 0 once detached
    pub fn current_level(&self) -> f32 {
        if self.task.is_none() {
            return 0.0;
        }
        *self.levels.borrow()
    }

    pub fn is_attached(&self) -> bool {
        self.task.is_some()
    }

    /// Cancel the sampling loop, release the analyser and publish 0
    pub fn detach(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        task.abort();

        let mut slot = self.analyser.lock();
        slot.take();
        self.levels.send_replace(0.0);
    }
}

impl Drop for LevelMonitor {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_of_silence_is_zero() {
        assert_eq!(level_from_bins(&[0; 16]), 0.0);
    }

    #[test]
    fn test_level_is_clamped_to_max() {
        assert_eq!(level_from_bins(&[255; 16]), MAX_LEVEL);
    }

    #[test]
    fn test_level_ignores_dc_and_high_bins() {
        let mut bins = [0u8; 16];
        bins[0] = 255;
        bins[10] = 255;
        assert_eq!(level_from_bins(&bins), 0.0);
    }

    #[test]
    fn test_level_scales_band_average() {
        let mut bins = [0u8; 16];
        for b in &mut bins[1..=5] {
            *b = 102; // 40% of full scale
        }
        let level = level_from_bins(&bins);
        assert!((level - 60.0).abs() < 0.01, "got {}", level);
    }

    #[test]
    fn test_level_is_monotonic_in_loudness() {
        let mut last = 0.0;
        for value in (0..=255u8).step_by(15) {
            let level = level_from_bins(&[value; 16]);
            assert!(level >= last);
            assert!((0.0..=MAX_LEVEL).contains(&level));
            last = level;
        }
    }

    #[test]
    fn test_short_spectrum_is_tolerated() {
        assert_eq!(level_from_bins(&[]), 0.0);
        assert_eq!(level_from_bins(&[200]), 0.0);
    }
}
