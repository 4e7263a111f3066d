use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

use crate::audio::AudioBackendConfig;
use crate::session::{HandoffMode, SessionConfig};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub voice: VoiceConfig,
    pub permission: PermissionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Signed init data from the host app, sent as `Authorization: tma <init_data>`
    pub init_data: Option<String>,
    /// Development fallback identity, sent as `X-Telegram-Id` when there is no init data
    pub dev_telegram_id: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            init_data: None,
            dev_telegram_id: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Recordings shorter than this are discarded without a network call
    pub min_duration_ms: u64,
    /// Level meter sampling interval
    pub level_interval_ms: u64,
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_duration_ms: u64,
    /// Input device name; the system default when unset
    pub device: Option<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: 500,
            level_interval_ms: 16,
            sample_rate: 16000,
            channels: 1,
            buffer_duration_ms: 100,
            device: None,
        }
    }
}

impl VoiceConfig {
    pub fn backend_config(&self) -> AudioBackendConfig {
        AudioBackendConfig {
            target_sample_rate: self.sample_rate,
            target_channels: self.channels,
            buffer_duration_ms: self.buffer_duration_ms,
        }
    }

    pub fn session_config(&self, label: &str, handoff: HandoffMode) -> SessionConfig {
        SessionConfig {
            label: label.to_string(),
            min_duration: Duration::from_millis(self.min_duration_ms),
            level_interval: Duration::from_millis(self.level_interval_ms),
            backend: self.backend_config(),
            handoff,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PermissionConfig {
    pub cache_path: PathBuf,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("yakyn-voice-permission.json"),
        }
    }
}

impl Config {
    /// Load `path` (extension optional, file optional) layered under `YAKYN__*` env vars
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("YAKYN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() -> Result<()> {
        let cfg = Config::load("/nonexistent/yakyn-voice")?;

        assert_eq!(cfg.voice.min_duration_ms, 500);
        assert_eq!(cfg.voice.level_interval_ms, 16);
        assert_eq!(cfg.voice.sample_rate, 16000);
        assert_eq!(cfg.permission.cache_path, PathBuf::from("yakyn-voice-permission.json"));
        Ok(())
    }

    #[test]
    fn test_file_values_and_env_overrides() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("voice.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"https://api.example.test\"\n\n[voice]\nmin_duration_ms = 750\n",
        )?;

        std::env::set_var("YAKYN__API__TIMEOUT_SECS", "12");
        let cfg = Config::load(path.to_str().unwrap_or_default());
        std::env::remove_var("YAKYN__API__TIMEOUT_SECS");
        let cfg = cfg?;

        assert_eq!(cfg.api.base_url, "https://api.example.test");
        assert_eq!(cfg.api.timeout_secs, 12);
        assert_eq!(cfg.voice.min_duration_ms, 750);
        assert_eq!(cfg.voice.channels, 1);
        Ok(())
    }

    #[test]
    fn test_session_config_follows_voice_settings() {
        let voice = VoiceConfig {
            min_duration_ms: 300,
            ..Default::default()
        };
        let session = voice.session_config("note", HandoffMode::Transcript);

        assert_eq!(session.label, "note");
        assert_eq!(session.min_duration, Duration::from_millis(300));
        assert_eq!(session.level_interval, Duration::from_millis(16));
        assert_eq!(session.backend.target_sample_rate, 16000);
    }
}
