use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::PermissionState;
use super::store::PermissionStore;
use crate::audio::{AudioBackendConfig, AudioBackendProvider};
use crate::error::VoiceResult;
use crate::session::CaptureArbiter;

/// Platform permission surface, for hosts that can report microphone access
/// without opening the device
#[async_trait::async_trait]
pub trait PermissionQuery: Send + Sync {
    /// Current platform permission state
    async fn query(&self) -> VoiceResult<PermissionState>;

    /// Live change notifications, if the platform offers them
    fn subscribe(&self) -> Option<watch::Receiver<PermissionState>>;
}

/// Single owner of the app's microphone permission state
///
/// Build one at startup and share it; call sites read and change permission
/// only through these methods.
pub struct PermissionTracker {
    device_id: String,
    backends: Arc<dyn AudioBackendProvider>,
    backend_config: AudioBackendConfig,
    store: Arc<PermissionStore>,
    live: Option<Arc<dyn PermissionQuery>>,
    arbiter: CaptureArbiter,
    state: Arc<watch::Sender<PermissionState>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl PermissionTracker {
    pub fn new(
        backends: Arc<dyn AudioBackendProvider>,
        store: PermissionStore,
        backend_config: AudioBackendConfig,
    ) -> Self {
        let device_id = backends.device_id();
        let initial = store.get(&device_id).unwrap_or_default();
        let (state, _) = watch::channel(initial);

        info!("Permission tracker for {} starting as {}", device_id, initial);

        Self {
            device_id,
            backends,
            backend_config,
            store: Arc::new(store),
            live: None,
            arbiter: CaptureArbiter::global(),
            state: Arc::new(state),
            watcher: Mutex::new(None),
        }
    }

    /// Prefer a live platform query over the cached decision
    pub fn with_live_query(mut self, query: Arc<dyn PermissionQuery>) -> Self {
        self.live = Some(query);
        self
    }

    /// Contend for the microphone through `arbiter` instead of the process-wide one
    pub fn with_arbiter(mut self, arbiter: CaptureArbiter) -> Self {
        self.arbiter = arbiter;
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Last known state, without touching the platform
    pub fn status(&self) -> PermissionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PermissionState> {
        self.state.subscribe()
    }

    /// Best-effort refresh of the permission state
    ///
    /// Uses the live query when available and starts following its change
    /// notifications on first use. Falls back to the cached decision when
    /// there is no live query or it fails.
    pub async fn check_status(&self) -> PermissionState {
        if let Some(live) = &self.live {
            self.ensure_watching(live.as_ref());

            match live.query().await {
                Ok(state) => {
                    self.record(state);
                    return state;
                }
                Err(e) => warn!("Live permission query failed, using cached decision: {}", e),
            }
        }

        let cached = self.store.get(&self.device_id).unwrap_or_default();
        self.state.send_replace(cached);
        cached
    }

    /// Ask for microphone access by opening the device and closing it straight away
    ///
    /// Always re-prompts, even after an earlier denial. While another capture
    /// holds the microphone nothing is opened and the last known state is
    /// returned unchanged.
    pub async fn request_permission(&self) -> PermissionState {
        let Some(_lease) = self.arbiter.try_acquire("permission-request") else {
            info!("Microphone busy, not probing {} now", self.device_id);
            return self.status();
        };

        info!("Requesting microphone access for {}", self.device_id);

        match self.probe_device().await {
            Ok(()) => {
                info!("Microphone access granted");
                self.record(PermissionState::Granted);
                PermissionState::Granted
            }
            Err(e) => {
                warn!("Microphone access denied: {}", e);
                self.record(PermissionState::Denied);
                PermissionState::Denied
            }
        }
    }

    /// Note a denial discovered while opening a capture stream
    pub(crate) fn mark_denied(&self) {
        self.record(PermissionState::Denied);
    }

    async fn probe_device(&self) -> VoiceResult<()> {
        let mut backend = self.backends.create(&self.backend_config)?;
        let frames = backend.start().await?;
        drop(frames);

        if let Err(e) = backend.stop().await {
            // Access was proven; a failed close does not revoke it
            warn!("Failed to close {} after permission probe: {}", backend.name(), e);
        }
        Ok(())
    }

    fn record(&self, state: PermissionState) {
        self.store.set(&self.device_id, state);
        self.state.send_replace(state);
    }

    fn ensure_watching(&self, live: &dyn PermissionQuery) {
        let mut watcher = self.watcher.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if watcher.is_some() {
            return;
        }

        let Some(mut changes) = live.subscribe() else {
            return;
        };

        let state = Arc::clone(&self.state);
        let store = Arc::clone(&self.store);
        let device_id = self.device_id.clone();

        debug!("Following live permission changes for {}", device_id);

        *watcher = Some(tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let next = *changes.borrow_and_update();
                info!("Microphone permission changed to {}", next);
                store.set(&device_id, next);
                state.send_replace(next);
            }
        }));
    }
}

impl Drop for PermissionTracker {
    fn drop(&mut self) {
        let watcher = self.watcher.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = watcher.take() {
            task.abort();
        }
    }
}
