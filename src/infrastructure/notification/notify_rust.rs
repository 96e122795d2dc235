//! Desktop notification adapter using notify-rust

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};
use tracing::debug;

use crate::application::ports::{NotificationError, NoticeKind, Notifier};

/// How long routine notifications stay on screen
const DEFAULT_TIMEOUT_MS: u32 = 4000;

/// Desktop notifier for Linux (D-Bus), macOS and Windows
pub struct NotifyRustNotifier {
    app_name: String,
    timeout_ms: u32,
}

impl NotifyRustNotifier {
    pub fn new() -> Self {
        Self::with_app_name("Memento")
    }

    pub fn with_app_name(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Display time for everything except errors and the duration limit
    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Errors and the limit stay until dismissed
    fn timeout_for(&self, kind: NoticeKind) -> Timeout {
        match kind {
            NoticeKind::Error | NoticeKind::Limit => Timeout::Never,
            _ => Timeout::Milliseconds(self.timeout_ms),
        }
    }

    fn build(&self, title: &str, message: &str, kind: NoticeKind) -> Notification {
        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(title)
            .body(message)
            .icon(kind.icon())
            .timeout(self.timeout_for(kind));

        #[cfg(all(unix, not(target_os = "macos")))]
        {
            if kind == NoticeKind::Error {
                notification.urgency(notify_rust::Urgency::Critical);
            }
        }

        notification
    }
}

impl Default for NotifyRustNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// No notification server on the session bus is not worth retrying
fn classify(message: String) -> NotificationError {
    if message.contains("ServiceUnknown") || message.contains("was not provided by any") {
        NotificationError::Unavailable
    } else {
        NotificationError::SendFailed(message)
    }
}

#[async_trait]
impl Notifier for NotifyRustNotifier {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        kind: NoticeKind,
    ) -> Result<(), NotificationError> {
        let notification = self.build(title, message, kind);

        // Talking to the notification server blocks
        tokio::task::spawn_blocking(move || {
            notification
                .show()
                .map(|_| ())
                .map_err(|e| classify(e.to_string()))
        })
        .await
        .map_err(|e| NotificationError::SendFailed(format!("Task join error: {}", e)))??;

        debug!(kind = kind.icon(), "desktop notification shown");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires a notification daemon"]
    async fn shows_limit_notification() {
        let notifier = NotifyRustNotifier::new();
        let result = notifier
            .notify("Memento", "Maximum recording time reached", NoticeKind::Limit)
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn errors_and_limit_are_sticky() {
        let notifier = NotifyRustNotifier::new().with_timeout_ms(1500);
        assert_eq!(notifier.timeout_for(NoticeKind::Error), Timeout::Never);
        assert_eq!(notifier.timeout_for(NoticeKind::Limit), Timeout::Never);
        assert_eq!(
            notifier.timeout_for(NoticeKind::Recording),
            Timeout::Milliseconds(1500)
        );
    }

    #[test]
    fn missing_notification_server_is_unavailable() {
        let err = classify(
            "org.freedesktop.DBus.Error.ServiceUnknown: The name org.freedesktop.Notifications was not provided by any .service files".to_string(),
        );
        assert!(matches!(err, NotificationError::Unavailable));
        assert!(matches!(
            classify("timeout".to_string()),
            NotificationError::SendFailed(_)
        ));
    }
}
