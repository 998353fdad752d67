use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_FEEDBACK_DURATION_MS;

/// Host-supplied toggles consumed by the shell core.
///
/// Loading and merging of configuration sources is owned by the host; the
/// core only reads the resolved values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub enable_visual_feedback: bool,
    pub enable_audio_feedback: bool,
    pub feedback_duration_ms: u64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            enable_visual_feedback: true,
            enable_audio_feedback: false,
            feedback_duration_ms: DEFAULT_FEEDBACK_DURATION_MS,
        }
    }
}

impl ShellConfig {
    pub fn feedback_duration(&self) -> Duration {
        Duration::from_millis(self.feedback_duration_ms)
    }
}
