//! Clock source driving the countdown.
//!
//! A clock delivers [`Tick`]s on an mpsc channel at a nominal fixed period
//! while it is started. Each start opens a new generation so the consumer can
//! drop ticks that were queued by a schedule that has since been stopped.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::types::TICK_PERIOD;

// ============================================================================
// Tick
// ============================================================================

/// One clock signal, tagged with the schedule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Generation of the schedule that emitted this tick
    pub generation: u64,
}

// ============================================================================
// ClockSource
// ============================================================================

/// A startable, stoppable source of periodic ticks.
pub trait ClockSource: Send {
    /// Starts a new schedule, replacing any schedule already running.
    fn start(&mut self);

    /// Stops the current schedule. No-op when not started.
    fn stop(&mut self);

    /// Returns true while a schedule is active.
    fn is_started(&self) -> bool;

    /// Generation of the most recently started schedule.
    fn generation(&self) -> u64;
}

// ============================================================================
// IntervalClock
// ============================================================================

/// Clock backed by a `tokio::time::interval` task.
///
/// The task is aborted on `stop()` and on drop, so a schedule never outlives
/// the clock that owns it. `start()` must be called inside a tokio runtime.
pub struct IntervalClock {
    tick_tx: mpsc::UnboundedSender<Tick>,
    period: Duration,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl IntervalClock {
    /// Creates a stopped clock with the standard one-second period.
    pub fn new(tick_tx: mpsc::UnboundedSender<Tick>) -> Self {
        Self::with_period(tick_tx, TICK_PERIOD)
    }

    /// Creates a stopped clock with a custom period.
    pub fn with_period(tick_tx: mpsc::UnboundedSender<Tick>, period: Duration) -> Self {
        Self {
            tick_tx,
            period,
            generation: 0,
            task: None,
        }
    }

    /// Returns the tick period.
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl ClockSource for IntervalClock {
    fn start(&mut self) {
        self.stop();
        self.generation += 1;

        let generation = self.generation;
        let period = self.period;
        let tick_tx = self.tick_tx.clone();

        self.task = Some(tokio::spawn(async move {
            // First tick one full period after start, not immediately.
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if tick_tx.send(Tick { generation }).is_err() {
                    debug!("Tick receiver dropped, clock task exiting");
                    break;
                }
            }
        }));

        debug!(generation, "Clock started");
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(generation = self.generation, "Clock stopped");
        }
    }

    fn is_started(&self) -> bool {
        self.task.is_some()
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for IntervalClock {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for IntervalClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalClock")
            .field("period", &self.period)
            .field("generation", &self.generation)
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ManualClock
// ============================================================================

/// Clock that never ticks on its own; tests deliver ticks by hand.
///
/// Records start/stop calls so tests can check the clock lifecycle.
#[derive(Debug, Default)]
pub struct ManualClock {
    started: bool,
    generation: u64,
    start_calls: usize,
    stop_calls: usize,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A tick belonging to the current schedule.
    #[must_use]
    pub fn tick(&self) -> Tick {
        Tick {
            generation: self.generation,
        }
    }

    #[must_use]
    pub fn start_calls(&self) -> usize {
        self.start_calls
    }

    #[must_use]
    pub fn stop_calls(&self) -> usize {
        self.stop_calls
    }
}

impl ClockSource for ManualClock {
    fn start(&mut self) {
        self.started = true;
        self.generation += 1;
        self.start_calls += 1;
    }

    fn stop(&mut self) {
        if self.started {
            self.started = false;
            self.stop_calls += 1;
        }
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod manual_clock_tests {
        use super::*;

        #[test]
        fn test_new_is_stopped() {
            let clock = ManualClock::new();
            assert!(!clock.is_started());
            assert_eq!(clock.generation(), 0);
        }

        #[test]
        fn test_start_bumps_generation() {
            let mut clock = ManualClock::new();
            clock.start();
            assert!(clock.is_started());
            assert_eq!(clock.tick(), Tick { generation: 1 });

            clock.start();
            assert_eq!(clock.generation(), 2);
            assert_eq!(clock.start_calls(), 2);
        }

        #[test]
        fn test_stop_when_not_started_is_noop() {
            let mut clock = ManualClock::new();
            clock.stop();
            assert_eq!(clock.stop_calls(), 0);
        }
    }

    mod interval_clock_tests {
        use super::*;

        fn drain(rx: &mut mpsc::UnboundedReceiver<Tick>) -> Vec<Tick> {
            let mut ticks = Vec::new();
            while let Ok(tick) = rx.try_recv() {
                ticks.push(tick);
            }
            ticks
        }

        #[tokio::test(start_paused = true)]
        async fn test_ticks_once_per_period() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let mut clock = IntervalClock::new(tx);
            clock.start();

            tokio::time::sleep(Duration::from_millis(3500)).await;

            let ticks = drain(&mut rx);
            assert_eq!(ticks.len(), 3);
            assert!(ticks.iter().all(|t| t.generation == 1));
        }

        #[tokio::test(start_paused = true)]
        async fn test_no_immediate_tick_on_start() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let mut clock = IntervalClock::new(tx);
            clock.start();

            tokio::time::sleep(Duration::from_millis(900)).await;
            assert!(drain(&mut rx).is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn test_stop_halts_ticks() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let mut clock = IntervalClock::new(tx);
            clock.start();
            tokio::time::sleep(Duration::from_millis(1500)).await;
            clock.stop();
            assert!(!clock.is_started());

            let before = drain(&mut rx).len();
            tokio::time::sleep(Duration::from_secs(5)).await;
            assert_eq!(before, 1);
            assert!(drain(&mut rx).is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn test_restart_replaces_schedule() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let mut clock = IntervalClock::new(tx);
            clock.start();
            clock.start();
            assert_eq!(clock.generation(), 2);

            tokio::time::sleep(Duration::from_millis(2500)).await;

            let ticks = drain(&mut rx);
            assert_eq!(ticks.len(), 2, "only one schedule should be ticking");
            assert!(ticks.iter().all(|t| t.generation == 2));
        }

        #[tokio::test(start_paused = true)]
        async fn test_drop_aborts_task() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            {
                let mut clock = IntervalClock::with_period(tx, Duration::from_millis(100));
                clock.start();
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
            assert!(drain(&mut rx).is_empty());
        }

        #[test]
        fn test_stop_when_not_started_is_noop() {
            let (tx, _rx) = mpsc::unbounded_channel();
            let mut clock = IntervalClock::new(tx);
            clock.stop();
            assert!(!clock.is_started());
            assert_eq!(clock.period(), TICK_PERIOD);
        }
    }
}
