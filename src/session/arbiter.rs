// Process-wide microphone exclusivity
//
// Every controller acquires a lease here before opening a stream and drops it
// once the stream is closed, so at most one capture is live in the app.

use std::sync::{Arc, Mutex, OnceLock};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

static GLOBAL: OnceLock<CaptureArbiter> = OnceLock::new();

#[derive(Clone)]
pub struct CaptureArbiter {
    permits: Arc<Semaphore>,
    holder: Arc<Mutex<Option<String>>>,
}

impl CaptureArbiter {
    /// An arbiter independent of the process-wide one
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
            holder: Arc::new(Mutex::new(None)),
        }
    }

    /// The arbiter shared by every controller in the process
    pub fn global() -> Self {
        GLOBAL.get_or_init(Self::new).clone()
    }

    /// Take the microphone if nobody else holds it
    pub fn try_acquire(&self, label: &str) -> Option<CaptureLease> {
        let permit = match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                debug!(
                    "Capture requested by {} while held by {}",
                    label,
                    self.holder().unwrap_or_else(|| "unknown".to_string())
                );
                return None;
            }
        };

        *self.lock_holder() = Some(label.to_string());

        Some(CaptureLease {
            _permit: permit,
            holder: Arc::clone(&self.holder),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.permits.available_permits() == 0
    }

    /// Label of the controller currently capturing
    pub fn holder(&self) -> Option<String> {
        self.lock_holder().clone()
    }

    fn lock_holder(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.holder.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for CaptureArbiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive right to capture; released on drop
pub struct CaptureLease {
    _permit: OwnedSemaphorePermit,
    holder: Arc<Mutex<Option<String>>>,
}

impl Drop for CaptureLease {
    fn drop(&mut self) {
        // Runs before the permit field is dropped, so no new holder can be overwritten
        self.holder
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }
}
