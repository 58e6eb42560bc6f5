//! Build notifications.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// A message for the developer, optionally with a sound name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub sound: Option<String>,
    /// Whether the notification reports a failure.
    pub failure: bool,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sound: None,
            failure: false,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            failure: true,
            ..Self::success(message)
        }
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }
}

/// Delivers notifications (desktop, chat, log...).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// [`Notifier`] that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        if notification.failure {
            error!(sound = ?notification.sound, "{}", notification.message);
        } else {
            info!(sound = ?notification.sound, "{}", notification.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let ok = Notification::success("Build looks good...");
        assert!(!ok.failure);
        assert!(ok.sound.is_none());

        let failed = Notification::failure("Ooops build failed...").with_sound("Sosumi");
        assert!(failed.failure);
        assert_eq!(failed.sound.as_deref(), Some("Sosumi"));
    }

    #[test]
    fn test_log_notifier_does_not_panic() {
        LogNotifier.notify(&Notification::success("Build was successful").with_sound("Glass"));
        LogNotifier.notify(&Notification::failure("Ooops build failed..."));
    }
}
