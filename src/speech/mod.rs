//! Spoken alert channel.
//!
//! Speech is delegated to a text-to-speech command found on the host:
//!
//! | Platform | Command |
//! |---|---|
//! | macOS | `say` |
//! | Linux | `spd-say`, `espeak-ng`, `espeak` (first found) |
//!
//! Speaking is fire-and-forget: [`Speaker::speak`] returns once playback has
//! begun. A new utterance cancels the one still playing. Without a command the
//! channel is inert and `speak` quietly succeeds.
//!
//! Each utterance's process is owned by a task that waits for it, so a
//! finished or cancelled command never lingers as a zombie.

mod error;

use std::path::PathBuf;
use std::process::{Command as StdCommand, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use self::error::SpeechError;

/// Maximum number of characters spoken per utterance.
const MAX_UTTERANCE_LENGTH: usize = 200;

/// Sanitizes text for speaking.
///
/// Control characters are removed and the text is truncated. Returns `None`
/// if nothing speakable remains.
pub fn sanitize_utterance(text: &str) -> Option<String> {
    let sanitized: String = text
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_UTTERANCE_LENGTH)
        .collect();
    let trimmed = sanitized.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ============================================================================
// Speaker
// ============================================================================

/// Text-to-speech utterance player.
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Begins speaking `text`, cancelling any utterance still playing.
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Returns true if utterances can actually be heard.
    fn is_available(&self) -> bool;
}

// ============================================================================
// SpeechBackend
// ============================================================================

/// Text-to-speech commands this crate knows how to drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechBackend {
    /// macOS `say`
    Say,
    /// speech-dispatcher `spd-say`
    SpdSay,
    /// `espeak-ng`
    EspeakNg,
    /// `espeak`
    Espeak,
    /// User-supplied program, run as `program [args..] -- <text>`
    Custom { program: PathBuf, args: Vec<String> },
    /// No speech available
    Silent,
}

impl SpeechBackend {
    /// Detects the best available backend for the current platform.
    pub fn detect() -> Self {
        #[cfg(target_os = "macos")]
        {
            if Self::command_exists("say") {
                return Self::Say;
            }
        }

        for backend in [Self::SpdSay, Self::EspeakNg, Self::Espeak] {
            if Self::command_exists(backend.name()) {
                return backend;
            }
        }

        Self::Silent
    }

    /// Backend running `program` with no extra arguments.
    pub fn custom(program: impl Into<PathBuf>) -> Self {
        Self::Custom {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Checks if a command exists on `PATH`.
    fn command_exists(cmd: &str) -> bool {
        StdCommand::new("which")
            .arg(cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Returns the command name of this backend.
    pub fn name(&self) -> &str {
        match self {
            Self::Say => "say",
            Self::SpdSay => "spd-say",
            Self::EspeakNg => "espeak-ng",
            Self::Espeak => "espeak",
            Self::Custom { program, .. } => program.to_str().unwrap_or("custom"),
            Self::Silent => "silent",
        }
    }

    /// Builds the command that speaks `text`, or `None` when silent.
    pub fn command(&self, text: &str) -> Option<Command> {
        let mut cmd = match self {
            Self::Silent => return None,
            // Without --wait spd-say returns at once and cannot be cancelled by kill.
            Self::SpdSay => {
                let mut cmd = Command::new(self.name());
                cmd.arg("--wait");
                cmd
            }
            Self::Custom { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            Self::Say | Self::EspeakNg | Self::Espeak => Command::new(self.name()),
        };
        cmd.arg("--")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        Some(cmd)
    }
}

// ============================================================================
// SystemSpeaker
// ============================================================================

/// A running TTS process and the task that waits on it.
struct Utterance {
    pid: Option<u32>,
    cancel: oneshot::Sender<()>,
    waiter: JoinHandle<()>,
}

/// Speaker that runs the host's text-to-speech command.
pub struct SystemSpeaker {
    backend: SpeechBackend,
    /// Utterance currently playing, if any
    current: Mutex<Option<Utterance>>,
}

impl SystemSpeaker {
    /// Creates a speaker using the detected backend.
    #[must_use]
    pub fn new() -> Self {
        let backend = SpeechBackend::detect();
        debug!(backend = backend.name(), "Speech backend selected");
        Self::with_backend(backend)
    }

    /// Creates a speaker with an explicit backend.
    #[must_use]
    pub fn with_backend(backend: SpeechBackend) -> Self {
        Self {
            backend,
            current: Mutex::new(None),
        }
    }

    /// Creates an inert speaker.
    #[must_use]
    pub fn silent() -> Self {
        Self::with_backend(SpeechBackend::Silent)
    }

    /// Returns the backend in use.
    pub fn backend(&self) -> &SpeechBackend {
        &self.backend
    }

    /// Stops the utterance currently playing, if any, and waits until its
    /// process has been reaped.
    pub async fn cancel(&self) {
        let utterance = self.lock_current().take();
        if let Some(utterance) = utterance {
            debug!(pid = ?utterance.pid, "Cancelling utterance");
            // Fails only when the process already finished on its own.
            let _ = utterance.cancel.send(());
            if let Err(e) = utterance.waiter.await {
                debug!("Utterance waiter ended abnormally: {}", e);
            }
        }
    }

    #[cfg(test)]
    fn current_pid(&self) -> Option<u32> {
        self.lock_current().as_ref().and_then(|u| u.pid)
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<Utterance>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Waits for the TTS process to finish, or kills it on cancel.
async fn supervise(
    mut child: tokio::process::Child,
    cancel: oneshot::Receiver<()>,
    backend: String,
) {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) if status.success() => debug!(%backend, "Utterance finished"),
            Ok(status) => warn!(
                "{}",
                SpeechError::PlaybackError(format!("{} exited with {}", backend, status))
            ),
            Err(e) => warn!("{}", SpeechError::PlaybackError(e.to_string())),
        },
        // Also taken when the speaker is dropped.
        _ = cancel => {
            if let Err(e) = child.kill().await {
                debug!("Could not stop utterance: {}", e);
            }
            debug!(%backend, "Utterance cancelled");
        }
    }
}

impl Default for SystemSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SystemSpeaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemSpeaker")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Speaker for SystemSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let Some(text) = sanitize_utterance(text) else {
            debug!("Nothing to speak");
            return Ok(());
        };

        let Some(mut cmd) = self.backend.command(&text) else {
            debug!("Speech unavailable, skipping utterance");
            return Ok(());
        };

        self.cancel().await;

        let backend = self.backend.name().to_string();
        let child = cmd.spawn().map_err(|e| SpeechError::SpawnFailed {
            command: backend.clone(),
            reason: e.to_string(),
        })?;

        let pid = child.id();
        let (cancel, cancelled) = oneshot::channel();
        debug!(%backend, ?pid, %text, "Utterance started");
        let waiter = tokio::spawn(supervise(child, cancelled, backend));

        let previous = self.lock_current().replace(Utterance {
            pid,
            cancel,
            waiter,
        });
        // A concurrent speak started in between; this one wins.
        if let Some(previous) = previous {
            let _ = previous.cancel.send(());
        }

        Ok(())
    }

    fn is_available(&self) -> bool {
        self.backend != SpeechBackend::Silent
    }
}

// ============================================================================
// MockSpeaker
// ============================================================================

/// Mock speaker for testing.
#[derive(Debug)]
pub struct MockSpeaker {
    spoken: Mutex<Vec<String>>,
    available: AtomicBool,
    should_fail: AtomicBool,
}

impl Default for MockSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSpeaker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            spoken: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Sanitized utterances in the order they were started.
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl Speaker for MockSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SpeechError::PlaybackError("Mock failure".to_string()));
        }
        if !self.available.load(Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(text) = sanitize_utterance(text) {
            self.spoken.lock().unwrap().push(text);
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
