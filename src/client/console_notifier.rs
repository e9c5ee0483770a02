use crate::domain_port::{Notification, NotificationLevel, Notifier};

/// Prints notifications to stderr, the terminal stand-in for toasts.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => eprintln!("✔ {}", notification.message),
            NotificationLevel::Error => eprintln!("✘ {}", notification.message),
        }
    }
}
