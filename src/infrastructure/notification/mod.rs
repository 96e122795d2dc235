//! Notification infrastructure module
//!
//! Terminal output for interactive sessions, plus cross-platform desktop
//! notifications via notify-rust when enabled.

mod console;
mod notify_rust;

pub use console::{CompositeNotifier, ConsoleNotifier};
pub use notify_rust::NotifyRustNotifier;

/// Create the notifier for a CLI session
///
/// Always reports to the terminal; `desktop` adds desktop notifications.
pub fn create_notifier(desktop: bool) -> CompositeNotifier {
    let mut notifiers: Vec<Box<dyn crate::application::ports::Notifier>> =
        vec![Box::new(ConsoleNotifier::new())];
    if desktop {
        notifiers.push(Box::new(NotifyRustNotifier::new()));
    }
    CompositeNotifier::new(notifiers)
}
