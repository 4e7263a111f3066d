use serde::{Deserialize, Serialize};

/// Microphone access as last known to the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    /// The platform will ask the user on the next access attempt
    Prompt,
    /// Nothing queried or cached yet
    #[default]
    Unknown,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }

    /// Granted and denied are the only states worth remembering across runs
    pub fn is_decisive(self) -> bool {
        matches!(self, PermissionState::Granted | PermissionState::Denied)
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
            PermissionState::Prompt => "prompt",
            PermissionState::Unknown => "unknown",
        };
        f.write_str(label)
    }
}
