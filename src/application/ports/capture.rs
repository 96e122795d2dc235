//! Audio capture port interfaces

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("Audio capture resource is already in use")]
    ResourceBusy,

    #[error("No audio input device available")]
    NoDevice,

    #[error("Audio capture failed: {0}")]
    Failed(String),
}

/// Port for the platform audio capture subsystem.
///
/// The platform allows a single active capture at a time. Acquiring while
/// another handle is active fails with [`CaptureError::ResourceBusy`].
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Acquire the capture resource and prepare a new recording handle.
    ///
    /// # Returns
    /// An inactive handle; call [`CaptureHandle::start`] to begin capturing
    async fn acquire(&self) -> Result<Box<dyn CaptureHandle>, CaptureError>;

    /// Forcibly clear any platform-level capture left active by a handle
    /// that was lost or abandoned. Safe to call when nothing is active.
    async fn force_release(&self);
}

/// One acquired recording.
#[async_trait]
pub trait CaptureHandle: Send {
    /// Begin writing audio to the temporary capture file
    async fn start(&mut self) -> Result<(), CaptureError>;

    /// Suspend capture; the resource stays held
    async fn pause(&mut self) -> Result<(), CaptureError>;

    /// Continue a paused capture
    async fn resume(&mut self) -> Result<(), CaptureError>;

    /// Finalize the capture file and release the platform resource.
    ///
    /// # Returns
    /// Path of the temporary capture file
    async fn stop_and_release(&mut self) -> Result<PathBuf, CaptureError>;
}
