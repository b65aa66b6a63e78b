//! 20-20-20 eye-care timer.
//!
//! Every twenty minutes of work the timer calls a twenty second rest, then
//! goes back to work, until stopped. This library provides:
//! - The timer session state machine and its read-only snapshot
//! - A one-second clock source and the engine that drives the session
//! - Alert delivery over desktop notifications and text-to-speech
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities

pub mod alert;
pub mod cli;
pub mod daemon;
pub mod notification;
pub mod speech;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    IpcRequest, IpcResponse, NotificationAuthorization, TimerPhase, TimerSession, TimerSnapshot,
    REST_DURATION, TICK_PERIOD, WORK_DURATION,
};

pub use alert::{AlertDispatcher, AlertEvent};

pub use daemon::{
    ClockSource, Daemon, DaemonConfig, IntervalClock, ManualClock, Tick, TimerEngine,
};

pub use notification::{
    DesktopNotifier, MockNotifier, Notification, NotificationError, Notifier,
};

pub use speech::{MockSpeaker, SpeechBackend, SpeechError, Speaker, SystemSpeaker};
