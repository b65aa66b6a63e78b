//! Speech channel error types.

use thiserror::Error;

/// Errors that can occur while speaking.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// No text-to-speech command was found on this host.
    #[error("no text-to-speech engine available")]
    NotAvailable,

    /// The text-to-speech command could not be started.
    #[error("failed to start speech command '{command}': {reason}")]
    SpawnFailed {
        /// Command that failed to start
        command: String,
        /// Underlying error
        reason: String,
    },

    /// Generic playback error.
    #[error("speech playback error: {0}")]
    PlaybackError(String),
}

impl SpeechError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NotAvailable => "Install espeak-ng or speech-dispatcher (spd-say)",
            Self::SpawnFailed { .. } => "Check that the speech command is executable",
            Self::PlaybackError(_) => "Check your audio output device",
        }
    }
}
