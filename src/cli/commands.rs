//! Command definitions for the eye-rest CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Utterance used by `say` when no text is given.
pub const DEFAULT_UTTERANCE: &str = "Rest. Look away from your screen.";

/// Maximum length accepted for `say` text.
const MAX_SAY_LENGTH: usize = 200;

// ============================================================================
// CLI Structure
// ============================================================================

/// 20-20-20 eye-care timer
#[derive(Parser, Debug)]
#[command(
    name = "eyerest",
    version,
    about = "20-20-20 eye-care timer",
    long_about = "20-20-20 eye-care timer.\n\n\
                  Every 20 minutes, look at something 20 feet away for 20 seconds.\n\
                  Run `eyerest daemon` once, then control it with start, pause and stop.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Daemon socket path [default: ~/.eyerest/eyerest.sock]
    #[arg(long, global = true, env = "EYEREST_SOCKET", value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the timer daemon in the foreground
    Daemon(DaemonArgs),

    /// Start the timer, or resume it if paused
    Start,

    /// Pause the timer
    Pause,

    /// Stop the timer and reset it
    Stop,

    /// Show current timer status
    Status,

    /// Ask for permission to show desktop notifications
    Notify,

    /// Speak a line through the daemon's voice channel
    Say {
        /// Text to speak
        #[arg(default_value = DEFAULT_UTTERANCE, value_parser = validate_say_text)]
        text: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Daemon Command Arguments
// ============================================================================

/// Arguments for the daemon command
#[derive(Args, Debug, Clone, Default)]
pub struct DaemonArgs {
    /// Do not speak alerts
    #[arg(long)]
    pub no_voice: bool,

    /// Ask for notification permission at startup
    #[arg(short = 'n', long)]
    pub request_notifications: bool,

    /// Speak through this program instead of the detected one; the text is
    /// passed after `--`
    #[arg(long, value_name = "PROGRAM", conflicts_with = "no_voice")]
    pub voice_command: Option<PathBuf>,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates text for `say`.
///
/// - Must contain something other than whitespace
/// - Must not exceed 200 characters
fn validate_say_text(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("text cannot be empty".to_string());
    }
    if s.chars().count() > MAX_SAY_LENGTH {
        return Err(format!("text must be at most {} characters", MAX_SAY_LENGTH));
    }
    Ok(s.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // ------------------------------------------------------------------------
    // Cli Tests
    // ------------------------------------------------------------------------

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_no_args() {
            let cli = Cli::parse_from(["eyerest"]);
            assert!(cli.command.is_none());
            assert!(!cli.verbose);
        }

        #[test]
        fn test_parse_verbose_flag() {
            let cli = Cli::parse_from(["eyerest", "--verbose"]);
            assert!(cli.verbose);
        }

        #[test]
        fn test_parse_short_verbose_flag() {
            let cli = Cli::parse_from(["eyerest", "status", "-v"]);
            assert!(cli.verbose);
        }

        #[test]
        fn test_parse_socket_option() {
            let cli = Cli::parse_from(["eyerest", "status", "--socket", "/tmp/e.sock"]);
            assert_eq!(cli.socket, Some(PathBuf::from("/tmp/e.sock")));
        }

        #[test]
        fn test_parse_commands() {
            let cli = Cli::parse_from(["eyerest", "start"]);
            assert!(matches!(cli.command, Some(Commands::Start)));

            let cli = Cli::parse_from(["eyerest", "pause"]);
            assert!(matches!(cli.command, Some(Commands::Pause)));

            let cli = Cli::parse_from(["eyerest", "stop"]);
            assert!(matches!(cli.command, Some(Commands::Stop)));

            let cli = Cli::parse_from(["eyerest", "status"]);
            assert!(matches!(cli.command, Some(Commands::Status)));

            let cli = Cli::parse_from(["eyerest", "notify"]);
            assert!(matches!(cli.command, Some(Commands::Notify)));
        }

        #[test]
        fn test_help_names_the_rule() {
            let long = Cli::command().render_long_help().to_string();
            assert!(long.contains("20-20-20"));
            assert!(long.contains("20 feet away"));

            let short = Cli::command().render_help().to_string();
            assert!(short.contains("20-20-20"));
        }

        #[test]
        fn test_parse_completions_zsh() {
            let cli = Cli::parse_from(["eyerest", "completions", "zsh"]);
            match cli.command {
                Some(Commands::Completions { shell }) => {
                    assert_eq!(shell, clap_complete::Shell::Zsh);
                }
                _ => panic!("Expected Completions command"),
            }
        }
    }

    // ------------------------------------------------------------------------
    // Daemon Command Tests
    // ------------------------------------------------------------------------

    mod daemon_args_tests {
        use super::*;

        #[test]
        fn test_parse_daemon_defaults() {
            let cli = Cli::parse_from(["eyerest", "daemon"]);
            match cli.command {
                Some(Commands::Daemon(args)) => {
                    assert!(!args.no_voice);
                    assert!(!args.request_notifications);
                    assert!(args.voice_command.is_none());
                }
                _ => panic!("Expected Daemon command"),
            }
        }

        #[test]
        fn test_parse_daemon_voice_command() {
            let cli = Cli::parse_from(["eyerest", "daemon", "--voice-command", "/usr/bin/piper-say"]);
            match cli.command {
                Some(Commands::Daemon(args)) => {
                    assert_eq!(args.voice_command, Some(PathBuf::from("/usr/bin/piper-say")));
                }
                _ => panic!("Expected Daemon command"),
            }
        }

        #[test]
        fn test_voice_command_conflicts_with_no_voice() {
            let result = Cli::try_parse_from([
                "eyerest",
                "daemon",
                "--no-voice",
                "--voice-command",
                "/usr/bin/piper-say",
            ]);
            assert!(result.is_err());
        }

        #[test]
        fn test_parse_daemon_options() {
            let cli = Cli::parse_from(["eyerest", "daemon", "--no-voice", "-n"]);
            match cli.command {
                Some(Commands::Daemon(args)) => {
                    assert!(args.no_voice);
                    assert!(args.request_notifications);
                }
                _ => panic!("Expected Daemon command"),
            }
        }
    }

    // ------------------------------------------------------------------------
    // Say Command Tests
    // ------------------------------------------------------------------------

    mod say_tests {
        use super::*;

        #[test]
        fn test_parse_say_default_text() {
            let cli = Cli::parse_from(["eyerest", "say"]);
            match cli.command {
                Some(Commands::Say { text }) => assert_eq!(text, DEFAULT_UTTERANCE),
                _ => panic!("Expected Say command"),
            }
        }

        #[test]
        fn test_parse_say_text() {
            let cli = Cli::parse_from(["eyerest", "say", "Blink slowly"]);
            match cli.command {
                Some(Commands::Say { text }) => assert_eq!(text, "Blink slowly"),
                _ => panic!("Expected Say command"),
            }
        }

        #[test]
        fn test_validate_say_text() {
            assert!(validate_say_text("hello").is_ok());
            assert!(validate_say_text(&"a".repeat(200)).is_ok());
            assert!(validate_say_text(&"a".repeat(201)).unwrap_err().contains("200"));
            assert!(validate_say_text("  ").unwrap_err().contains("empty"));
        }
    }

    // ------------------------------------------------------------------------
    // Error Case Tests (using try_parse)
    // ------------------------------------------------------------------------

    mod error_tests {
        use super::*;

        #[test]
        fn test_parse_say_empty_rejected() {
            let result = Cli::try_parse_from(["eyerest", "say", ""]);
            assert!(result.is_err());
        }

        #[test]
        fn test_parse_unknown_command() {
            let result = Cli::try_parse_from(["eyerest", "unknown"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_parse_completions_invalid_shell() {
            let result = Cli::try_parse_from(["eyerest", "completions", "invalid"]);
            assert!(result.is_err());
        }
    }
}
