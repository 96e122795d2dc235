//! Audio playback port
//!
//! Loads a stored recording and plays it back.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during playback
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// The file could not be opened or decoded
    #[error("Failed to load audio: {0}")]
    LoadFailed(String),

    /// Failed to play the loaded sound
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// No audio output device available
    #[error("Audio device not available: {0}")]
    DeviceNotAvailable(String),
}

/// Called once when a loaded sound plays to its end.
pub type CompletionCallback = Arc<dyn Fn() + Send + Sync>;

/// Port for the platform audio playback subsystem
#[async_trait]
pub trait AudioPlayback: Send + Sync {
    /// Load a sound from disk, paused at its beginning.
    ///
    /// # Arguments
    /// * `path` - The audio file to load
    /// * `on_finish` - Invoked when playback reaches the end of the sound
    async fn load(
        &self,
        path: &Path,
        on_finish: CompletionCallback,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError>;
}

/// One loaded sound
#[async_trait]
pub trait PlaybackHandle: Send {
    /// Play from the current position
    async fn play(&mut self) -> Result<(), PlaybackError>;

    async fn pause(&mut self) -> Result<(), PlaybackError>;

    /// Move back to the beginning of the sound
    async fn rewind(&mut self) -> Result<(), PlaybackError>;

    /// Release the sound; the handle is unusable afterwards
    async fn unload(&mut self) -> Result<(), PlaybackError>;
}
