//! Core data types for the eye-rest timer.
//!
//! This module defines the data structures used for:
//! - Timer phase and session state
//! - The read-only snapshot handed to the presentation layer
//! - Notification authorization mirrored from the host
//! - IPC request/response serialization

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Length of a work phase in seconds (20 minutes).
pub const WORK_DURATION: u32 = 20 * 60;

/// Length of a rest phase in seconds.
pub const REST_DURATION: u32 = 20;

/// Nominal period of one clock tick.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

// ============================================================================
// TimerPhase
// ============================================================================

/// Represents the current phase of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    /// No active countdown
    #[default]
    Idle,
    /// Counting down a work period
    Working,
    /// Counting down an eye break
    Resting,
}

impl TimerPhase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Working => "working",
            TimerPhase::Resting => "resting",
        }
    }

    /// Full length of a countdown in this phase, in seconds.
    ///
    /// Idle reports the work duration, which is what an idle timer displays.
    pub fn duration(&self) -> u32 {
        match self {
            TimerPhase::Idle | TimerPhase::Working => WORK_DURATION,
            TimerPhase::Resting => REST_DURATION,
        }
    }

    /// The phase entered when a countdown in this phase expires.
    pub fn next(&self) -> Option<TimerPhase> {
        match self {
            TimerPhase::Idle => None,
            TimerPhase::Working => Some(TimerPhase::Resting),
            TimerPhase::Resting => Some(TimerPhase::Working),
        }
    }
}

// ============================================================================
// TimerSession
// ============================================================================

/// The mutable state of the single timer owned by a process.
///
/// Only the four transition methods below mutate it. The engine in
/// `daemon::timer` wraps them with clock lifecycle and alert emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSession {
    /// Current phase of the timer
    pub phase: TimerPhase,
    /// Remaining seconds in the current phase
    pub remaining_seconds: u32,
    /// Whether the clock is currently advancing the countdown
    pub running: bool,
}

impl Default for TimerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerSession {
    /// Creates the canonical idle session.
    pub fn new() -> Self {
        Self {
            phase: TimerPhase::Idle,
            remaining_seconds: WORK_DURATION,
            running: false,
        }
    }

    /// Starts or resumes the countdown.
    ///
    /// Only an idle session is reset to a fresh work period; a paused one
    /// resumes from where it stopped.
    pub fn start(&mut self) {
        if self.phase == TimerPhase::Idle {
            self.phase = TimerPhase::Working;
            self.remaining_seconds = WORK_DURATION;
        }
        self.running = true;
    }

    /// Freezes the countdown in place.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Discards any countdown and returns to idle.
    pub fn stop(&mut self) {
        *self = Self::new();
    }

    /// Advances the countdown by one second.
    ///
    /// Returns the phase that was entered when the tick expired the current
    /// countdown. A tick on a session that is not running, or is idle, is
    /// ignored and returns `None`.
    pub fn tick(&mut self) -> Option<TimerPhase> {
        if !self.running {
            return None;
        }
        let next = self.phase.next()?;

        // Expire at 1 rather than 0 so no zero is ever displayed.
        if self.remaining_seconds <= 1 {
            self.phase = next;
            self.remaining_seconds = next.duration();
            Some(next)
        } else {
            self.remaining_seconds -= 1;
            None
        }
    }

    /// Returns true if the countdown is advancing.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns true if the session holds the canonical idle snapshot.
    pub fn is_idle(&self) -> bool {
        *self == Self::new()
    }

    /// Checks the per-phase bounds on `remaining_seconds`.
    pub fn is_consistent(&self) -> bool {
        match self.phase {
            TimerPhase::Idle => !self.running && self.remaining_seconds == WORK_DURATION,
            TimerPhase::Working => self.remaining_seconds <= WORK_DURATION,
            TimerPhase::Resting => self.remaining_seconds <= REST_DURATION,
        }
    }
}

// ============================================================================
// NotificationAuthorization
// ============================================================================

/// Host permission state for the notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationAuthorization {
    /// Never requested; the channel is inert
    #[default]
    Default,
    /// Notifications may be shown
    Granted,
    /// The host refused or lacks a notification service
    Denied,
}

impl NotificationAuthorization {
    /// Returns the string representation of the authorization.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationAuthorization::Default => "default",
            NotificationAuthorization::Granted => "granted",
            NotificationAuthorization::Denied => "denied",
        }
    }

    /// Returns true if notifications may be shown.
    pub fn is_granted(&self) -> bool {
        matches!(self, NotificationAuthorization::Granted)
    }

    /// Returns true once the request has been answered either way.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, NotificationAuthorization::Default)
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Read-only view of the timer handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Current phase
    pub phase: TimerPhase,
    /// Remaining seconds in the current phase
    #[serde(rename = "remainingSeconds")]
    pub remaining_seconds: u32,
    /// Whole minutes remaining
    pub minutes: u32,
    /// Seconds past the whole minutes
    pub seconds: u32,
    /// Whether the countdown is advancing
    pub running: bool,
    /// Mirrored notification permission
    #[serde(rename = "notificationAuthorization")]
    pub notification_authorization: NotificationAuthorization,
}

impl TimerSnapshot {
    /// Builds a snapshot from the session and the mirrored authorization.
    pub fn new(session: &TimerSession, authorization: NotificationAuthorization) -> Self {
        Self {
            phase: session.phase,
            remaining_seconds: session.remaining_seconds,
            minutes: session.remaining_seconds / 60,
            seconds: session.remaining_seconds % 60,
            running: session.running,
            notification_authorization: authorization,
        }
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Reset to idle
    Stop,
    /// Query the current snapshot
    Status,
    /// Ask the host for notification permission
    Notify,
    /// Speak arbitrary text on the audio channel
    Speak {
        /// Text to speak
        text: String,
    },
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Snapshot taken after the command ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<TimerSnapshot>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<TimerSnapshot>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true for a success response.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
