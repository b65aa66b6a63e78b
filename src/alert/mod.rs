//! Alert dispatch for phase changes.
//!
//! Every phase change produces one [`AlertEvent`]. The [`AlertDispatcher`]
//! fans it out to two independent channels:
//!
//! ```text
//!                    ┌──────────────────────┐
//!                ┌──▶│ Notifier (gated by   │
//! ┌────────────┐ │   │ authorization)       │
//! │ AlertEvent │─┤   └──────────────────────┘
//! └────────────┘ │   ┌──────────────────────┐
//!                └──▶│ Speaker              │
//!                    └──────────────────────┘
//! ```
//!
//! Both channels are fire-and-forget. A failing or missing channel is logged
//! and never reaches the timer engine.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::notification::{Notification, Notifier};
use crate::speech::Speaker;

// ============================================================================
// AlertEvent
// ============================================================================

/// Notice emitted when the timer changes phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertEvent {
    /// A work period expired and the eye break began
    RestStarted,
    /// The eye break expired and work resumed
    WorkResumed,
}

impl AlertEvent {
    /// Notification title for this event.
    pub fn title(&self) -> &'static str {
        match self {
            AlertEvent::RestStarted => "👀 Time to Rest!",
            AlertEvent::WorkResumed => "💪 Back to Work!",
        }
    }

    /// Notification body for this event.
    pub fn body(&self) -> &'static str {
        match self {
            AlertEvent::RestStarted => "Look at something 20 feet away for 20 seconds",
            AlertEvent::WorkResumed => "Your 20 second eye break is over",
        }
    }

    /// Text spoken on the audio channel for this event.
    pub fn utterance(&self) -> &'static str {
        match self {
            AlertEvent::RestStarted => "Rest. Look away from your screen.",
            AlertEvent::WorkResumed => "Back to work.",
        }
    }

    /// Builds the desktop notification for this event.
    pub fn notification(&self) -> Notification {
        Notification::new(self.title(), self.body())
    }
}

// ============================================================================
// AlertDispatcher
// ============================================================================

/// Delivers alert events to the notification and speech channels.
#[derive(Clone)]
pub struct AlertDispatcher {
    notifier: Arc<dyn Notifier>,
    speaker: Arc<dyn Speaker>,
}

impl AlertDispatcher {
    /// Creates a dispatcher over the given channels.
    pub fn new(notifier: Arc<dyn Notifier>, speaker: Arc<dyn Speaker>) -> Self {
        Self { notifier, speaker }
    }

    /// Returns the notification channel.
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Returns the speech channel.
    pub fn speaker(&self) -> &Arc<dyn Speaker> {
        &self.speaker
    }

    /// Hands the event to both channels without waiting for either.
    ///
    /// Must be called inside a tokio runtime.
    pub fn dispatch(&self, event: AlertEvent) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.deliver(event).await })
    }

    /// Delivers the event to both channels concurrently and waits for both.
    pub async fn deliver(&self, event: AlertEvent) {
        tokio::join!(self.notify(event), self.announce(event));
    }

    /// Shows the notification if the host granted permission.
    async fn notify(&self, event: AlertEvent) {
        let authorization = self.notifier.authorization();
        if !authorization.is_granted() {
            debug!(
                ?event,
                authorization = authorization.as_str(),
                "Notification skipped, not authorized"
            );
            return;
        }

        if let Err(e) = self.notifier.send(&event.notification()).await {
            warn!(?event, "Failed to show notification: {}", e);
        }
    }

    /// Speaks the event's utterance.
    async fn announce(&self, event: AlertEvent) {
        if let Err(e) = self.speaker.speak(event.utterance()).await {
            warn!(?event, "Failed to speak alert: {}", e);
        }
    }
}

impl std::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertDispatcher")
            .field("authorization", &self.notifier.authorization())
            .field("speech_available", &self.speaker.is_available())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
