//! Notification system error types.
//!
//! None of these are fatal: the dispatcher logs them and the notification
//! channel degrades to inert.

use thiserror::Error;

/// Errors that can occur in the notification system.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Failed to obtain an authorization answer from the host.
    #[error("failed to request notification permission: {0}")]
    AuthorizationFailed(String),

    /// Failed to send a notification.
    #[error("failed to send notification: {0}")]
    SendFailed(String),

    /// Notification permission is not granted.
    #[error("notification permission has not been granted")]
    PermissionDenied,

    /// The host has no notification service.
    #[error("no notification service available: {0}")]
    NotAvailable(String),
}

impl NotificationError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::AuthorizationFailed(_) => "Run `eyerest notify` again once the desktop session is up",
            Self::PermissionDenied => "Run `eyerest notify` to enable notifications",
            Self::SendFailed(_) => "Check that your notification daemon is running",
            Self::NotAvailable(_) => {
                "Install a notification daemon (e.g. dunst or mako) or use a desktop session"
            }
        }
    }
}
