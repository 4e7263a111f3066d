//! Recording sessions behind a single voice input control
//!
//! A [`RecordingController`] owns one start/stop cycle at a time:
//! - Opening the capture backend once permission is granted
//! - Publishing a live input level while recording
//! - Gating short recordings before any transcription call
//! - Handing the finished recording to a [`crate::transcription::Transcriber`]
//!
//! The [`CaptureArbiter`] keeps two controllers from capturing at once.

mod arbiter;
mod config;
mod controller;
mod state;

pub use arbiter::{CaptureArbiter, CaptureLease};
pub use config::SessionConfig;
pub use controller::RecordingController;
pub use state::{HandoffMode, SessionOutcome, SessionState, StartOutcome};
