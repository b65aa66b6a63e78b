//! Display utilities for the eye-rest CLI.
//!
//! This module provides formatted output for:
//! - Command confirmations
//! - Error messages
//! - Status display

use crate::types::{NotificationAuthorization, TimerPhase, TimerSnapshot};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the daemon's confirmation message and the resulting clock.
    pub fn show_command_result(message: &str, snapshot: Option<&TimerSnapshot>) {
        match snapshot {
            Some(snapshot) => println!(
                "{} ({} {})",
                message,
                Self::phase_label(snapshot.phase),
                Self::format_clock(snapshot)
            ),
            None => println!("{}", message),
        }
    }

    /// Shows the current timer status.
    pub fn show_status(snapshot: Option<&TimerSnapshot>) {
        match snapshot {
            Some(snapshot) => println!("{}", Self::format_status(snapshot)),
            None => println!("The timer is not running"),
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {}", message);
    }

    /// Renders the status block.
    pub fn format_status(snapshot: &TimerSnapshot) -> String {
        let state = if snapshot.running {
            "running"
        } else if snapshot.phase == TimerPhase::Idle {
            "stopped"
        } else {
            "paused"
        };

        format!(
            "{}\n{}\n{}\n\nState: {}\nNotifications: {}",
            Self::format_clock(snapshot),
            Self::phase_label(snapshot.phase),
            Self::phase_subtext(snapshot.phase),
            state,
            Self::authorization_label(snapshot.notification_authorization),
        )
    }

    /// Formats the countdown as `MM:SS`.
    pub fn format_clock(snapshot: &TimerSnapshot) -> String {
        format!("{:02}:{:02}", snapshot.minutes, snapshot.seconds)
    }

    /// Short name of a phase.
    pub fn phase_label(phase: TimerPhase) -> &'static str {
        match phase {
            TimerPhase::Idle => "Ready",
            TimerPhase::Working => "Work",
            TimerPhase::Resting => "Rest",
        }
    }

    /// Hint shown under the phase name.
    pub fn phase_subtext(phase: TimerPhase) -> &'static str {
        match phase {
            TimerPhase::Idle => "Press play to start",
            TimerPhase::Working => "Focus on your screen",
            TimerPhase::Resting => "Look 20ft away",
        }
    }

    fn authorization_label(authorization: NotificationAuthorization) -> &'static str {
        match authorization {
            NotificationAuthorization::Default => "not requested (run `eyerest notify`)",
            NotificationAuthorization::Granted => "enabled",
            NotificationAuthorization::Denied => "unavailable",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
