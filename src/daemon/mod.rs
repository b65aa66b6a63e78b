//! Daemon module for the eye-rest timer.
//!
//! This module contains the core daemon functionality:
//! - `clock`: One-second tick source with start/stop
//! - `timer`: Timer engine with phase transitions and countdown logic
//! - `ipc`: Unix socket server the CLI talks to
//!
//! [`Daemon`] wires them together with the alert channels and runs a single
//! event loop until SIGINT or SIGTERM.

pub mod clock;
pub mod ipc;
pub mod timer;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::alert::{AlertDispatcher, AlertEvent};
use crate::notification::DesktopNotifier;
use crate::speech::{Speaker, SpeechBackend, SpeechError, SystemSpeaker};
use crate::types::TICK_PERIOD;

pub use clock::{ClockSource, IntervalClock, ManualClock, Tick};
pub use ipc::{IpcError, IpcServer, RequestHandler};
pub use timer::TimerEngine;

// ============================================================================
// DaemonConfig
// ============================================================================

/// Runtime options for the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    /// Unix socket the daemon listens on
    pub socket_path: PathBuf,
    /// Whether alerts are spoken
    pub voice: bool,
    /// Program used for speech instead of the detected one
    pub voice_command: Option<PathBuf>,
    /// Whether to ask for notification permission at startup
    pub request_notifications: bool,
}

impl DaemonConfig {
    pub fn new(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            voice: true,
            voice_command: None,
            request_notifications: false,
        }
    }
}

// ============================================================================
// Daemon
// ============================================================================

/// The running timer service.
pub struct Daemon {
    config: DaemonConfig,
    server: IpcServer,
    engine: Arc<Mutex<TimerEngine>>,
    alerts: AlertDispatcher,
    tick_rx: mpsc::UnboundedReceiver<Tick>,
    event_rx: mpsc::UnboundedReceiver<AlertEvent>,
}

impl Daemon {
    /// Creates a daemon using the host's notification and speech services.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(config: DaemonConfig) -> Result<Self> {
        let speaker = match (&config.voice_command, config.voice) {
            (_, false) => SystemSpeaker::silent(),
            (Some(program), true) => SystemSpeaker::with_backend(SpeechBackend::custom(program.clone())),
            (None, true) => SystemSpeaker::new(),
        };
        if config.voice && !speaker.is_available() {
            let e = SpeechError::NotAvailable;
            warn!("{}", e);
            info!("{}", e.suggestion());
        }
        let alerts = AlertDispatcher::new(Arc::new(DesktopNotifier::new()), Arc::new(speaker));
        Self::with_alerts(config, alerts, TICK_PERIOD)
    }

    /// Creates a daemon over explicit alert channels and tick period.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn with_alerts(
        config: DaemonConfig,
        alerts: AlertDispatcher,
        tick_period: Duration,
    ) -> Result<Self> {
        let server = IpcServer::new(&config.socket_path)?;

        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let clock = IntervalClock::with_period(tick_tx, tick_period);
        let engine = Arc::new(Mutex::new(TimerEngine::new(Box::new(clock), event_tx)));

        Ok(Self {
            config,
            server,
            engine,
            alerts,
            tick_rx,
            event_rx,
        })
    }

    /// Returns the shared engine.
    pub fn engine(&self) -> Arc<Mutex<TimerEngine>> {
        Arc::clone(&self.engine)
    }

    /// Runs until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the event loop fails.
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Runs until `shutdown` completes.
    ///
    /// On shutdown the engine is stopped and the socket file removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the event loop fails.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let Self {
            config,
            server,
            engine,
            alerts,
            mut tick_rx,
            mut event_rx,
        } = self;

        info!(socket = ?server.socket_path(), voice = config.voice, "Daemon listening");

        if config.request_notifications {
            let notifier = Arc::clone(alerts.notifier());
            tokio::spawn(async move {
                if let Err(e) = notifier.request_authorization().await {
                    warn!("Notification permission request failed: {}", e);
                }
            });
        }

        let handler = RequestHandler::new(Arc::clone(&engine), alerts.clone());
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Some(tick) = tick_rx.recv() => {
                    engine.lock().await.handle_tick(tick);
                }
                Some(event) = event_rx.recv() => {
                    debug!(?event, "Dispatching alert");
                    alerts.dispatch(event);
                }
                accepted = server.accept() => match accepted {
                    Ok(stream) => {
                        let handler = handler.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handler.serve(stream).await {
                                warn!("IPC request failed: {:#}", e);
                                if let Some(ipc_error) = e.downcast_ref::<IpcError>() {
                                    debug!("{}", ipc_error.suggestion());
                                }
                            }
                        });
                    }
                    Err(e) => warn!("{:#}", e),
                },
                () = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        engine.lock().await.stop();
        drop(server);
        info!("Daemon stopped");
        Ok(())
    }
}

/// Completes on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
