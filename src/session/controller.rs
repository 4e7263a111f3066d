use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::arbiter::{CaptureArbiter, CaptureLease};
use super::config::SessionConfig;
use super::state::{HandoffMode, SessionOutcome, SessionState, StartOutcome};
use crate::audio::{
    AnalyserHandle, AudioBackend, AudioBackendProvider, AudioFrame, LevelMonitor, RecordedAudio,
    SpectrumAnalyser,
};
use crate::error::{VoiceError, VoiceResult};
use crate::permission::PermissionTracker;
use crate::transcription::Transcriber;

/// Drives one start/stop recording cycle at a time for a single input control
///
/// A controller owns at most one capture. Starting opens the device, feeds the
/// level monitor and buffers frames; stopping closes everything it opened and
/// hands the buffered audio to the transcriber exactly once, unless the
/// recording was too short to keep.
pub struct RecordingController {
    config: SessionConfig,
    backends: Arc<dyn AudioBackendProvider>,
    permissions: Arc<PermissionTracker>,
    transcriber: Arc<dyn Transcriber>,
    arbiter: CaptureArbiter,

    /// The live capture, if any; held across start/stop so gestures serialize
    active: Mutex<Option<ActiveCapture>>,

    state: watch::Sender<SessionState>,
    /// Bumped on every start so a finishing stop only resets its own session
    generation: AtomicU64,
    levels: Arc<watch::Sender<f32>>,
}

/// Everything opened for one capture
struct ActiveCapture {
    session_id: Uuid,
    generation: u64,
    backend: Box<dyn AudioBackend>,
    monitor: LevelMonitor,
    pump: Option<JoinHandle<Vec<AudioFrame>>>,
    pump_stop: Option<oneshot::Sender<()>>,
    started_at: Instant,
    recorded_at: DateTime<Utc>,
    _lease: CaptureLease,
}

impl RecordingController {
    pub fn new(
        config: SessionConfig,
        backends: Arc<dyn AudioBackendProvider>,
        permissions: Arc<PermissionTracker>,
        transcriber: Arc<dyn Transcriber>,
        arbiter: CaptureArbiter,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        let (levels, _) = watch::channel(0.0);

        Self {
            config,
            backends,
            permissions,
            transcriber,
            arbiter,
            active: Mutex::new(None),
            state,
            generation: AtomicU64::new(0),
            levels: Arc::new(levels),
        }
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Latest input level in [0, 100]; 0 whenever not recording
    pub fn current_level(&self) -> f32 {
        if self.state() != SessionState::Recording {
            return 0.0;
        }
        *self.levels.borrow()
    }

    pub fn subscribe_levels(&self) -> watch::Receiver<f32> {
        self.levels.subscribe()
    }

    /// Begin capturing
    ///
    /// Never opens the device unless permission is already granted; the
    /// caller decides whether to prompt. Returns an error only when opening
    /// the device fails, in which case nothing stays open.
    pub async fn start(&self) -> VoiceResult<StartOutcome> {
        let mut active = self.active.lock().await;

        if active.is_some() || self.state() != SessionState::Idle {
            debug!("[{}] Start ignored, controller is {:?}", self.config.label, self.state());
            return Ok(StartOutcome::AlreadyActive);
        }

        let permission = self.permissions.status();
        if !permission.is_granted() {
            info!("[{}] Start blocked, microphone permission is {}", self.config.label, permission);
            return Ok(StartOutcome::PermissionRequired(permission));
        }

        let Some(lease) = self.arbiter.try_acquire(&self.config.label) else {
            info!("[{}] Start blocked, microphone is in use", self.config.label);
            return Ok(StartOutcome::Busy);
        };

        let mut backend = self.backends.create(&self.config.backend)?;
        let frames = match backend.start().await {
            Ok(frames) => frames,
            Err(VoiceError::PermissionDenied) => {
                warn!("[{}] Microphone access was revoked", self.config.label);
                self.permissions.mark_denied();
                return Err(VoiceError::PermissionDenied);
            }
            Err(e) => {
                error!("[{}] Failed to open {}: {}", self.config.label, backend.name(), e);
                return Err(e);
            }
        };

        let session_id = Uuid::new_v4();
        let analyser = AnalyserHandle::new(SpectrumAnalyser::new());
        let monitor = LevelMonitor::attach(
            analyser.clone(),
            Arc::clone(&self.levels),
            self.config.level_interval,
        );

        let (pump_stop, stop_rx) = oneshot::channel();
        let pump = tokio::spawn(pump_frames(frames, analyser, stop_rx));

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        *active = Some(ActiveCapture {
            session_id,
            generation,
            backend,
            monitor,
            pump: Some(pump),
            pump_stop: Some(pump_stop),
            started_at: Instant::now(),
            recorded_at: Utc::now(),
            _lease: lease,
        });
        self.state.send_replace(SessionState::Recording);

        info!("[{}] Recording started (session {})", self.config.label, session_id);
        Ok(StartOutcome::Started(session_id))
    }

    /// End capturing and hand the recording off
    ///
    /// The device is closed and the level reset before anything else happens.
    /// Recordings shorter than the minimum duration are dropped silently.
    pub async fn stop(&self) -> VoiceResult<SessionOutcome> {
        let stopped_at = Instant::now();

        let mut active = self.active.lock().await;
        let Some(mut capture) = active.take() else {
            debug!("[{}] Stop ignored, not recording", self.config.label);
            return Ok(SessionOutcome::NotRecording);
        };

        // Armed before the first await: a dropped stop still ends up idle
        let _idle = IdleOnDrop {
            state: &self.state,
            generation: &self.generation,
            session: capture.generation,
        };

        let elapsed = stopped_at.saturating_duration_since(capture.started_at);
        let frames = capture.finish().await;
        let recording = RecordedAudio {
            session_id: capture.session_id,
            frames,
            elapsed,
            recorded_at: capture.recorded_at,
        };
        drop(capture);

        if elapsed < self.config.min_duration {
            info!(
                "[{}] Discarding {}ms recording (minimum {}ms)",
                self.config.label,
                elapsed.as_millis(),
                self.config.min_duration.as_millis()
            );
            return Ok(SessionOutcome::Discarded { elapsed });
        }

        self.state.send_replace(SessionState::Transcribing);
        drop(active);

        if recording.is_empty() {
            warn!("[{}] Recording captured no audio, skipping transcription", self.config.label);
            return Ok(SessionOutcome::Empty);
        }

        info!(
            "[{}] Recording stopped after {:.2}s, {} samples",
            self.config.label,
            recording.elapsed.as_secs_f32(),
            recording.sample_count()
        );

        self.hand_off(&recording).await
    }

    /// Close any live capture without a handoff
    pub async fn shutdown(&self) {
        let mut active = self.active.lock().await;
        if let Some(mut capture) = active.take() {
            info!("[{}] Shutting down live recording {}", self.config.label, capture.session_id);
            capture.finish().await;
        }
        self.state.send_replace(SessionState::Idle);
    }

    async fn hand_off(&self, recording: &RecordedAudio) -> VoiceResult<SessionOutcome> {
        let outcome = match self.config.handoff {
            HandoffMode::Transcript => self
                .transcriber
                .transcribe(recording)
                .await
                .map(|text| {
                    if text.trim().is_empty() {
                        SessionOutcome::Empty
                    } else {
                        SessionOutcome::Transcript(text)
                    }
                }),
            HandoffMode::ContactDraft => self
                .transcriber
                .extract_contact(recording)
                .await
                .map(|contact| {
                    if contact.is_empty() {
                        SessionOutcome::Empty
                    } else {
                        SessionOutcome::Contact(contact)
                    }
                }),
        };

        match &outcome {
            Ok(SessionOutcome::Empty) => {
                info!("[{}] Nothing recognized in session {}", self.config.label, recording.session_id)
            }
            Ok(_) => info!("[{}] Session {} recognized", self.config.label, recording.session_id),
            Err(e) => error!("[{}] Transcription failed: {}", self.config.label, e),
        }

        outcome
    }
}

impl ActiveCapture {
    /// Stop the level feed, close the device and collect the buffered frames
    async fn finish(&mut self) -> Vec<AudioFrame> {
        self.monitor.detach();

        if let Err(e) = self.backend.stop().await {
            warn!("Failed to stop {}: {}", self.backend.name(), e);
        }

        if let Some(stop) = self.pump_stop.take() {
            let _ = stop.send(());
        }

        let Some(pump) = self.pump.take() else {
            return Vec::new();
        };

        match pump.await {
            Ok(frames) => frames,
            Err(e) => {
                error!("Frame pump for session {} failed: {}", self.session_id, e);
                Vec::new()
            }
        }
    }
}

impl Drop for ActiveCapture {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

/// Returns the controller to idle however a stop ends, unless a newer
/// session has started in the meantime
struct IdleOnDrop<'a> {
    state: &'a watch::Sender<SessionState>,
    generation: &'a AtomicU64,
    session: u64,
}

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        // Checked under the watch lock; start bumps the generation before publishing Recording
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != self.session || *state == SessionState::Idle {
                return false;
            }
            *state = SessionState::Idle;
            true
        });
    }
}

/// Buffer frames and feed the analyser until told to stop or the stream ends
async fn pump_frames(
    mut frames: mpsc::Receiver<AudioFrame>,
    analyser: AnalyserHandle,
    mut stop: oneshot::Receiver<()>,
) -> Vec<AudioFrame> {
    let mut buffered = Vec::new();

    loop {
        tokio::select! {
            biased;

            _ = &mut stop => {
                while let Ok(frame) = frames.try_recv() {
                    buffered.push(frame);
                }
                break;
            }
            frame = frames.recv() => match frame {
                Some(frame) => {
                    analyser.push(&frame.samples);
                    buffered.push(frame);
                }
                None => break,
            },
        }
    }

    debug!("Frame pump collected {} frames", buffered.len());
    buffered
}

