// Shared test doubles for capture and transcription
#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use yakyn_voice::audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioBackendProvider, AudioFrame,
    AudioSource, RecordedAudio,
};
use yakyn_voice::session::CaptureArbiter;
use yakyn_voice::{
    ContactExtraction, PermissionState, PermissionStore, PermissionTracker, Transcriber,
    VoiceError, VoiceResult, VoiceServices,
};

/// A loud tone that lands squarely in the level meter's band
pub fn tone_frame(len: usize) -> AudioFrame {
    let samples = (0..len)
        .map(|i| if (i / 4) % 2 == 0 { 20_000 } else { -20_000 })
        .collect();

    AudioFrame {
        samples,
        sample_rate: 16000,
        channels: 1,
        timestamp_ms: 0,
    }
}

/// Counts every stream opened and closed through it
#[derive(Clone, Default)]
pub struct CountingDevice {
    pub opens: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    pub creates: Arc<AtomicUsize>,
    pub deny: Arc<AtomicBool>,
}

impl CountingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn open_streams(&self) -> usize {
        self.opens() - self.closes()
    }

    pub fn set_deny(&self, deny: bool) {
        self.deny.store(deny, Ordering::SeqCst);
    }
}

impl AudioBackendProvider for CountingDevice {
    fn create(&self, _config: &AudioBackendConfig) -> VoiceResult<Box<dyn AudioBackend>> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingBackend {
            device: self.clone(),
            tx: None,
        }))
    }

    fn device_id(&self) -> String {
        "mock:default".to_string()
    }
}

pub struct CountingBackend {
    device: CountingDevice,
    tx: Option<mpsc::Sender<AudioFrame>>,
}

#[async_trait::async_trait]
impl AudioBackend for CountingBackend {
    async fn start(&mut self) -> VoiceResult<mpsc::Receiver<AudioFrame>> {
        if self.device.deny.load(Ordering::SeqCst) {
            return Err(VoiceError::PermissionDenied);
        }

        let (tx, rx) = mpsc::channel(16);
        tx.try_send(tone_frame(1600))
            .map_err(|e| VoiceError::DeviceUnavailable(e.to_string()))?;

        self.tx = Some(tx);
        self.device.opens.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    async fn stop(&mut self) -> VoiceResult<()> {
        if self.tx.take().is_some() {
            self.device.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.tx.is_some()
    }

    fn name(&self) -> &str {
        "counting mock"
    }
}

/// Scripted transcription service that records how often it was called
pub struct ScriptedTranscriber {
    pub calls: AtomicUsize,
    pub text: Mutex<VoiceResult<String>>,
    pub contact: Mutex<VoiceResult<ContactExtraction>>,
    pub last_audio: Mutex<Option<RecordedAudio>>,
    /// How long each call takes to answer
    pub delay: Duration,
}

impl ScriptedTranscriber {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            text: Mutex::new(Ok(String::new())),
            contact: Mutex::new(Ok(ContactExtraction::default())),
            last_audio: Mutex::new(None),
            delay: Duration::ZERO,
        }
    }

    pub fn with_text(self, text: &str) -> Self {
        *self.text.lock().unwrap() = Ok(text.to_string());
        self
    }

    pub fn with_contact(self, contact: ContactExtraction) -> Self {
        *self.contact.lock().unwrap() = Ok(contact);
        self
    }

    pub fn failing(self, message: &str) -> Self {
        *self.text.lock().unwrap() = Err(VoiceError::TranscriptionFailed(message.to_string()));
        *self.contact.lock().unwrap() = Err(VoiceError::TranscriptionFailed(message.to_string()));
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, audio: &RecordedAudio) -> VoiceResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_audio.lock().unwrap() = Some(audio.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.text.lock().unwrap().clone()
    }

    async fn extract_contact(&self, audio: &RecordedAudio) -> VoiceResult<ContactExtraction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_audio.lock().unwrap() = Some(audio.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.contact.lock().unwrap().clone()
    }
}

/// Tracker whose cache already holds `state` for the counting device
pub fn tracker_with(device: &CountingDevice, state: PermissionState) -> Arc<PermissionTracker> {
    tracker_sharing(device, state, CaptureArbiter::new())
}

/// Same as [`tracker_with`], contending for the microphone through `arbiter`
pub fn tracker_sharing(
    device: &CountingDevice,
    state: PermissionState,
    arbiter: CaptureArbiter,
) -> Arc<PermissionTracker> {
    let store = PermissionStore::in_memory();
    store.set(&device.device_id(), state);

    Arc::new(
        PermissionTracker::new(Arc::new(device.clone()), store, AudioBackendConfig::default())
            .with_arbiter(arbiter),
    )
}

/// Services wired to test doubles, with an arbiter private to the test
pub fn services(
    device: &CountingDevice,
    permission: PermissionState,
    transcriber: Arc<ScriptedTranscriber>,
) -> VoiceServices {
    let arbiter = CaptureArbiter::new();

    VoiceServices::new(
        tracker_sharing(device, permission, arbiter.clone()),
        Arc::new(device.clone()),
        transcriber,
    )
    .with_arbiter(arbiter)
}

/// Services that play `path` through the real file backend, permission granted
pub fn file_services(path: &Path, transcriber: Arc<ScriptedTranscriber>) -> VoiceServices {
    let arbiter = CaptureArbiter::new();
    let backends = AudioBackendFactory::new(AudioSource::File(path.to_path_buf()));
    let store = PermissionStore::in_memory();
    store.set(&backends.device_id(), PermissionState::Granted);

    let permissions = PermissionTracker::new(
        Arc::new(backends.clone()),
        store,
        AudioBackendConfig::default(),
    )
    .with_arbiter(arbiter.clone());

    VoiceServices::new(Arc::new(permissions), Arc::new(backends), transcriber).with_arbiter(arbiter)
}

/// Writes a 16 kHz mono 16-bit WAV carrying the same tone as [`tone_frame`]
pub fn write_tone_wav(path: &Path, duration: Duration) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let len = (duration.as_millis() as usize) * 16;

    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in tone_frame(len).samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(())
}

pub const HOLD: Duration = Duration::from_millis(800);
