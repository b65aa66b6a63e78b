//! Desktop notification channel.
//!
//! This module provides:
//!
//! - The [`Notifier`] contract the alert dispatcher depends on
//! - [`DesktopNotifier`], backed by `notify-rust`
//! - [`MockNotifier`] for tests
//!
//! # Authorization
//!
//! Authorization starts as `Default` and is resolved at most once. A desktop
//! host has no interactive permission prompt, so the request probes for a
//! notification service instead: present means `Granted`, absent means
//! `Denied`. Later requests return the resolved value unchanged.

pub mod error;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub use self::error::NotificationError;

use crate::types::NotificationAuthorization;

/// Application name shown by the notification server.
pub const APP_NAME: &str = "eyerest";

// ============================================================================
// Notification
// ============================================================================

/// A notification to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Notification title
    pub title: String,
    /// Notification body
    pub body: String,
}

impl Notification {
    /// Creates a notification with a title and body.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

// ============================================================================
// Notifier
// ============================================================================

/// Permission-gated notification publisher.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Current mirrored authorization.
    fn authorization(&self) -> NotificationAuthorization;

    /// Resolves authorization, asking the host only the first time.
    async fn request_authorization(&self) -> Result<NotificationAuthorization, NotificationError>;

    /// Shows a notification.
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
}

// ============================================================================
// DesktopNotifier
// ============================================================================

/// Notifier that talks to the host's notification server.
#[derive(Debug, Default)]
pub struct DesktopNotifier {
    resolved: OnceCell<NotificationAuthorization>,
}

impl DesktopNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that a notification server is reachable.
    ///
    /// Blocking: talks to D-Bus on Linux and the BSDs.
    #[cfg(all(unix, not(target_os = "macos")))]
    fn probe() -> Result<(), NotificationError> {
        let info = notify_rust::get_server_information()
            .map_err(|e| NotificationError::NotAvailable(e.to_string()))?;
        debug!(server = %info.name, vendor = %info.vendor, "Notification server found");
        Ok(())
    }

    /// macOS and Windows always ship a notification center.
    #[cfg(not(all(unix, not(target_os = "macos"))))]
    fn probe() -> Result<(), NotificationError> {
        Ok(())
    }

    async fn resolve() -> NotificationAuthorization {
        let probed = tokio::task::spawn_blocking(Self::probe)
            .await
            .map_err(|e| NotificationError::AuthorizationFailed(e.to_string()))
            .and_then(|r| r);

        match probed {
            Ok(()) => {
                info!("Notifications enabled");
                NotificationAuthorization::Granted
            }
            Err(e) => {
                warn!("Notifications unavailable: {}", e);
                info!("{}", e.suggestion());
                NotificationAuthorization::Denied
            }
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    fn authorization(&self) -> NotificationAuthorization {
        self.resolved.get().copied().unwrap_or_default()
    }

    async fn request_authorization(&self) -> Result<NotificationAuthorization, NotificationError> {
        Ok(*self.resolved.get_or_init(Self::resolve).await)
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        if !self.authorization().is_granted() {
            return Err(NotificationError::PermissionDenied);
        }

        let title = notification.title.clone();
        let body = notification.body.clone();

        tokio::task::spawn_blocking(move || {
            notify_rust::Notification::new()
                .appname(APP_NAME)
                .summary(&title)
                .body(&body)
                .show()
                .map(|_| ())
                .map_err(|e| NotificationError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| NotificationError::SendFailed(e.to_string()))??;

        debug!(title = %notification.title, "Notification shown");
        Ok(())
    }
}

// ============================================================================
// MockNotifier
// ============================================================================

/// Mock notifier for testing.
///
/// Records every send it is asked to perform, whatever the authorization,
/// so tests can check that callers do their own gating.
#[derive(Debug, Default)]
pub struct MockNotifier {
    resolved: OnceCell<NotificationAuthorization>,
    sent: Mutex<Vec<Notification>>,
    capable: AtomicBool,
    should_fail: AtomicBool,
    probe_count: AtomicUsize,
}

impl MockNotifier {
    /// Creates a mock with unresolved authorization and no notification service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock whose authorization is already resolved.
    #[must_use]
    pub fn with_authorization(authorization: NotificationAuthorization) -> Self {
        let mock = Self::new();
        if authorization.is_resolved() {
            let _ = mock.resolved.set(authorization);
        }
        mock
    }

    /// Sets whether a future authorization request finds a service.
    pub fn set_capable(&self, capable: bool) {
        self.capable.store(capable, Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    #[must_use]
    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Number of times the host was actually asked.
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn authorization(&self) -> NotificationAuthorization {
        self.resolved.get().copied().unwrap_or_default()
    }

    async fn request_authorization(&self) -> Result<NotificationAuthorization, NotificationError> {
        let authorization = self
            .resolved
            .get_or_init(|| async {
                self.probe_count.fetch_add(1, Ordering::SeqCst);
                if self.capable.load(Ordering::SeqCst) {
                    NotificationAuthorization::Granted
                } else {
                    NotificationAuthorization::Denied
                }
            })
            .await;
        Ok(*authorization)
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed("Mock failure".to_string()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
