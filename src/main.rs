//! eyerest - 20-20-20 eye-care timer
//!
//! Every 20 minutes, look at something 20 feet away for 20 seconds:
//! - 20 minutes of work
//! - 20 seconds of rest, announced by notification and voice
//! - repeat until stopped

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use eyerest::cli::{default_socket_path, Cli, Commands, Display, IpcClient};
use eyerest::daemon::{Daemon, DaemonConfig};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    execute_with(cli, default_socket_path).await
}

/// Executes the CLI command, resolving the socket with `default_socket` only
/// for commands that talk to the daemon and only when `--socket` is absent.
async fn execute_with<F>(cli: Cli, default_socket: F) -> Result<()>
where
    F: Fn() -> Result<PathBuf>,
{
    let explicit_socket = cli.socket;
    let socket_path = || match &explicit_socket {
        Some(path) => Ok(path.clone()),
        None => default_socket(),
    };
    let client = || socket_path().map(IpcClient::with_socket_path);

    match cli.command {
        Some(Commands::Daemon(args)) => {
            let config = DaemonConfig {
                socket_path: socket_path()?,
                voice: !args.no_voice,
                voice_command: args.voice_command,
                request_notifications: args.request_notifications,
            };
            Daemon::new(config)?.run().await?;
        }
        Some(Commands::Start) => {
            let response = client()?.start().await?;
            Display::show_command_result(&response.message, response.data.as_ref());
        }
        Some(Commands::Pause) => {
            let response = client()?.pause().await?;
            Display::show_command_result(&response.message, response.data.as_ref());
        }
        Some(Commands::Stop) => {
            let response = client()?.stop().await?;
            Display::show_command_result(&response.message, response.data.as_ref());
        }
        Some(Commands::Status) => {
            let response = client()?.status().await?;
            Display::show_status(response.data.as_ref());
        }
        Some(Commands::Notify) => {
            let response = client()?.notify().await?;
            Display::show_command_result(&response.message, None);
        }
        Some(Commands::Say { text }) => {
            let response = client()?.speak(&text).await?;
            Display::show_command_result(&response.message, None);
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
