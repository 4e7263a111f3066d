// Microphone backend using cpal
//
// cpal streams are not Send, so each capture runs on a dedicated thread that
// owns the stream until told to stop. Dropping the stream releases the device.

use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;
use std::time::Instant;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};
use super::convert::{f32_to_i16, process_frame};
use crate::error::{VoiceError, VoiceResult};

pub struct CpalBackend {
    device_name: Option<String>,
    config: AudioBackendConfig,
    stop_tx: Option<std_mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalBackend {
    pub fn new(device_name: Option<String>, config: AudioBackendConfig) -> Self {
        Self {
            device_name,
            config,
            stop_tx: None,
            thread: None,
        }
    }

    fn find_device(name: Option<&str>) -> VoiceResult<Device> {
        let host = cpal::default_host();

        match name {
            Some(name) => host
                .input_devices()
                .map_err(|e| VoiceError::DeviceUnavailable(e.to_string()))?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| VoiceError::DeviceUnavailable(format!("input device '{}' not found", name))),
            None => host
                .default_input_device()
                .ok_or_else(|| VoiceError::DeviceUnavailable("no default input device".to_string())),
        }
    }

    fn build_stream(
        device_name: Option<&str>,
        target: &AudioBackendConfig,
        frame_tx: mpsc::Sender<AudioFrame>,
    ) -> VoiceResult<cpal::Stream> {
        let device = Self::find_device(device_name)?;
        let supported = device
            .default_input_config()
            .map_err(|e| VoiceError::DeviceUnavailable(e.to_string()))?;

        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();
        let source_rate = config.sample_rate.0;
        let source_channels = config.channels;

        info!(
            "Opening input device '{}': {}Hz, {} channels, format={:?}",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            source_rate,
            source_channels,
            sample_format
        );

        let started = Instant::now();
        let target_rate = target.target_sample_rate;
        let target_channels = target.target_channels;

        // Realtime callback: never block, drop frames when the consumer lags
        let emit = move |samples: Vec<i16>| {
            let frame = AudioFrame {
                samples,
                sample_rate: source_rate,
                channels: source_channels,
                timestamp_ms: started.elapsed().as_millis() as u64,
            };
            let _ = frame_tx.try_send(process_frame(frame, target_rate, target_channels));
        };

        let on_error = |err: cpal::StreamError| warn!("Input stream error: {}", err);

        let stream = match sample_format {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    emit(data.iter().map(|&s| f32_to_i16(s)).collect())
                },
                on_error,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| emit(data.to_vec()),
                on_error,
                None,
            ),
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    emit(data.iter().map(|&s| (s as i32 - 32768) as i16).collect())
                },
                on_error,
                None,
            ),
            other => {
                return Err(VoiceError::DeviceUnavailable(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| VoiceError::DeviceUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| VoiceError::DeviceUnavailable(e.to_string()))?;

        Ok(stream)
    }

    fn signal_stop(&mut self) -> Option<JoinHandle<()>> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        self.thread.take()
    }
}

#[async_trait::async_trait]
impl AudioBackend for CpalBackend {
    async fn start(&mut self) -> VoiceResult<mpsc::Receiver<AudioFrame>> {
        if self.thread.is_some() {
            return Err(VoiceError::DeviceUnavailable("already capturing".to_string()));
        }

        let (frame_tx, frame_rx) = mpsc::channel(128);
        let (ready_tx, ready_rx) = oneshot::channel::<VoiceResult<()>>();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let device_name = self.device_name.clone();
        let config = self.config.clone();

        let thread = std::thread::Builder::new()
            .name("yakyn-capture".to_string())
            .spawn(move || {
                match Self::build_stream(device_name.as_deref(), &config, frame_tx) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        // Hold the stream until stop is signalled or the backend is dropped
                        let _ = stop_rx.recv();
                        drop(stream);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(|e| VoiceError::DeviceUnavailable(e.to_string()))?;

        match ready_rx.await {
            Ok(Ok(())) => {
                self.stop_tx = Some(stop_tx);
                self.thread = Some(thread);
                info!("Microphone capture started");
                Ok(frame_rx)
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => Err(VoiceError::DeviceUnavailable(
                "capture thread exited before the stream opened".to_string(),
            )),
        }
    }

    async fn stop(&mut self) -> VoiceResult<()> {
        let Some(thread) = self.signal_stop() else {
            return Ok(());
        };

        tokio::task::spawn_blocking(move || thread.join())
            .await
            .map_err(|e| VoiceError::DeviceUnavailable(e.to_string()))?
            .map_err(|_| VoiceError::DeviceUnavailable("capture thread panicked".to_string()))?;

        info!("Microphone capture stopped");
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.thread.is_some()
    }

    fn name(&self) -> &str {
        "cpal microphone"
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        // The thread exits on its own once signalled; no need to wait here
        let _ = self.signal_stop();
    }
}
