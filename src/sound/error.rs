//! Sound system error types.

use thiserror::Error;

/// Errors that can occur while playing the completion chime.
#[derive(Debug, Error)]
pub enum SoundError {
    /// Audio output is not available (e.g., no device or no terminal).
    #[error("Audio device not available: {0}")]
    DeviceNotAvailable(String),

    /// Generic playback failure.
    #[error("Sound playback failed: {0}")]
    PlaybackError(String),
}

impl SoundError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_))
    }
}
