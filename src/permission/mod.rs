//! Microphone permission tracking
//!
//! - `PermissionState`: granted / denied / prompt / unknown
//! - `PermissionStore`: per-device decision cache that survives restarts
//! - `PermissionTracker`: the one object the rest of the app asks

mod state;
mod store;
mod tracker;

pub use state::PermissionState;
pub use store::PermissionStore;
pub use tracker::{PermissionQuery, PermissionTracker};
