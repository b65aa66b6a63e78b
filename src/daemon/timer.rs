//! Timer engine for the eye-rest timer.
//!
//! This module provides the core timer functionality:
//! - State transitions (Idle → Working ⇄ Resting)
//! - Ownership of the clock schedule, running only while the timer runs
//! - Alert events on every phase change

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::alert::AlertEvent;
use crate::types::{TimerPhase, TimerSession};

use super::clock::{ClockSource, Tick};

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that owns the session and the clock driving it.
///
/// Every operation is infallible. Alert events go out on an unbounded
/// channel so the engine never waits on an alert channel.
pub struct TimerEngine {
    /// Current session state
    session: TimerSession,
    /// Tick schedule, started exactly while `session.running` is true
    clock: Box<dyn ClockSource>,
    /// Alert event sender channel
    event_tx: mpsc::UnboundedSender<AlertEvent>,
}

impl TimerEngine {
    /// Creates an idle engine with the given clock and event channel.
    pub fn new(clock: Box<dyn ClockSource>, event_tx: mpsc::UnboundedSender<AlertEvent>) -> Self {
        Self {
            session: TimerSession::new(),
            clock,
            event_tx,
        }
    }

    /// Starts a work period from idle, or resumes a paused countdown.
    ///
    /// Calling this while already running changes nothing.
    pub fn start(&mut self) {
        if self.session.is_running() {
            debug!("Start ignored, timer already running");
            return;
        }

        self.session.start();
        self.clock.start();

        info!(
            phase = self.session.phase.as_str(),
            remaining = self.session.remaining_seconds,
            "Timer started"
        );
    }

    /// Pauses the countdown, keeping phase and remaining time.
    pub fn pause(&mut self) {
        if !self.session.is_running() {
            debug!("Pause ignored, timer not running");
            return;
        }

        self.session.pause();
        self.clock.stop();

        info!(
            phase = self.session.phase.as_str(),
            remaining = self.session.remaining_seconds,
            "Timer paused"
        );
    }

    /// Resets to idle, discarding any countdown in progress.
    pub fn stop(&mut self) {
        self.session.stop();
        self.clock.stop();

        info!("Timer stopped");
    }

    /// Advances the countdown by one second.
    ///
    /// Ignored when the timer is not running. On expiry the next phase begins
    /// within the same tick and exactly one alert event is emitted.
    pub fn on_tick(&mut self) {
        if !self.session.is_running() {
            debug!("Tick ignored, timer not running");
            return;
        }

        let Some(entered) = self.session.tick() else {
            return;
        };

        let event = match entered {
            TimerPhase::Resting => AlertEvent::RestStarted,
            TimerPhase::Working => AlertEvent::WorkResumed,
            TimerPhase::Idle => return,
        };

        info!(phase = entered.as_str(), ?event, "Phase changed");

        if self.event_tx.send(event).is_err() {
            warn!(?event, "Alert receiver dropped, alert not delivered");
        }
    }

    /// Handles a tick from the clock.
    ///
    /// Ticks from a schedule that has since been stopped or replaced are
    /// dropped.
    pub fn handle_tick(&mut self, tick: Tick) {
        if !self.clock.is_started() || tick.generation != self.clock.generation() {
            debug!(
                generation = tick.generation,
                current = self.clock.generation(),
                "Dropping stale tick"
            );
            return;
        }
        self.on_tick();
    }

    /// Returns a reference to the current session.
    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    /// Returns true if the clock schedule is active.
    pub fn is_clock_started(&self) -> bool {
        self.clock.is_started()
    }

    /// Returns a mutable reference to the session (for testing).
    #[cfg(test)]
    pub fn session_mut(&mut self) -> &mut TimerSession {
        &mut self.session
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.clock.stop();
    }
}

// ============================================================================
// Tests
// ============================================================================
