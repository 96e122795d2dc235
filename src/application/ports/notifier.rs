//! User-facing notices about the recording session

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("No notification service is available")]
    Unavailable,

    #[error("Notification could not be delivered: {0}")]
    SendFailed(String),
}

/// What a notice is about; sinks choose icon, urgency and lifetime from it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
    /// Capture has begun
    Recording,
    /// Capture ended at the configured maximum
    Limit,
}

impl NoticeKind {
    /// Freedesktop icon-naming-spec name
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Recording => "audio-input-microphone",
            Self::Limit => "appointment-soon",
            Self::Success => "dialog-ok",
            Self::Info => "dialog-information",
            Self::Warning => "dialog-warning",
            Self::Error => "dialog-error",
        }
    }
}

/// Sink for notices. Delivery is best effort; a failure is logged by the caller and never aborts a session.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        title: &str,
        body: &str,
        kind: NoticeKind,
    ) -> Result<(), NotificationError>;
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for Box<N> {
    async fn notify(
        &self,
        title: &str,
        body: &str,
        kind: NoticeKind,
    ) -> Result<(), NotificationError> {
        N::notify(self, title, body, kind).await
    }
}
