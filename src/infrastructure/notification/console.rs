//! Terminal notification adapter

use async_trait::async_trait;
use colored::*;

use crate::application::ports::{NotificationError, NoticeKind, Notifier};

/// Writes notifications to stderr, for interactive terminal sessions
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }

    fn format(message: &str, kind: NoticeKind) -> String {
        let marker = match kind {
            NoticeKind::Info => "ℹ".cyan(),
            NoticeKind::Success => "✓".green(),
            NoticeKind::Warning | NoticeKind::Limit => "⚠".yellow(),
            NoticeKind::Error => "✗".red(),
            NoticeKind::Recording => "●".red(),
        };
        format!("{} {}", marker, message)
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(
        &self,
        _title: &str,
        message: &str,
        kind: NoticeKind,
    ) -> Result<(), NotificationError> {
        // Start on a fresh line in case a progress line is being redrawn
        eprintln!("\r\x1b[2K{}", Self::format(message, kind));
        Ok(())
    }
}

/// Sends every notification to each of its notifiers
pub struct CompositeNotifier {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl CompositeNotifier {
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

#[async_trait]
impl Notifier for CompositeNotifier {
    /// Delivers to all notifiers; reports the first failure
    async fn notify(
        &self,
        title: &str,
        message: &str,
        kind: NoticeKind,
    ) -> Result<(), NotificationError> {
        let mut first_error = None;
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(title, message, kind).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
