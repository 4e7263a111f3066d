use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use super::state::PermissionState;

/// Remembers grant/deny decisions per device across app runs
///
/// Backed by a small JSON object (`{"mic:default": "granted"}`). Write
/// failures are logged and otherwise ignored: losing the cache only means the
/// user may be asked again.
pub struct PermissionStore {
    path: Option<PathBuf>,
    decisions: Mutex<HashMap<String, PermissionState>>,
}

impl PermissionStore {
    /// A store that forgets everything when dropped
    pub fn in_memory() -> Self {
        Self {
            path: None,
            decisions: Mutex::new(HashMap::new()),
        }
    }

    /// Load decisions from `path`, starting empty if the file is missing or unreadable
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let decisions = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, PermissionState>>(&raw) {
                Ok(map) => {
                    info!("Loaded {} cached permission decision(s) from {}", map.len(), path.display());
                    map.into_iter().filter(|(_, s)| s.is_decisive()).collect()
                }
                Err(e) => {
                    warn!("Ignoring malformed permission cache {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!("Failed to read permission cache {}: {}", path.display(), e);
                HashMap::new()
            }
        };

        Self {
            path: Some(path),
            decisions: Mutex::new(decisions),
        }
    }

    pub fn get(&self, device_id: &str) -> Option<PermissionState> {
        self.lock().get(device_id).copied()
    }

    /// Record a decision; non-decisive states are ignored
    pub fn set(&self, device_id: &str, state: PermissionState) {
        if !state.is_decisive() {
            return;
        }

        let snapshot = {
            let mut decisions = self.lock();
            if decisions.get(device_id) == Some(&state) {
                return;
            }
            decisions.insert(device_id.to_string(), state);
            decisions.clone()
        };

        debug!("Cached permission for {}: {}", device_id, state);
        self.persist(&snapshot);
    }

    fn persist(&self, decisions: &HashMap<String, PermissionState>) {
        let Some(path) = &self.path else {
            return;
        };

        let write = || -> anyhow::Result<()> {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, serde_json::to_vec_pretty(decisions)?)?;
            Ok(())
        };

        if let Err(e) = write() {
            warn!("Failed to write permission cache {}: {}", path.display(), e);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PermissionState>> {
        self.decisions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
