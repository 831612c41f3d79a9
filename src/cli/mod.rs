//! CLI module - command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod common;
pub mod config;
pub mod export;
pub mod forward;
pub mod session;
pub mod setup;
pub mod status;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tgrelay")]
#[command(version)]
#[command(about = "Resumable bulk message forwarding for Telegram bots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate source and target chats and save the job setup
    Setup {
        /// Source chat id (numeric id or @username)
        #[arg(long, allow_hyphen_values = true)]
        source: String,
        /// Target chat id (numeric id or @username)
        #[arg(long, allow_hyphen_values = true)]
        target: String,
        /// First message id to forward (defaults to 1)
        #[arg(long, default_value_t = 0)]
        start: u64,
        /// Keep the original messages instead of deleting them after forwarding
        #[arg(long)]
        keep_originals: bool,
    },
    /// Forward messages from the source chat to the target chat (Ctrl-C pauses)
    Forward {
        /// Continue a paused job instead of starting a new one
        #[arg(long)]
        resume: bool,
    },
    /// Show setup, job progress and result statistics
    Status,
    /// List the distinct original senders of forwarded messages
    Senders,
    /// Export successfully forwarded messages to CSV
    Export {
        /// Output file (default: ./forwarded_messages_<date>.csv)
        #[arg(long, short)]
        output: Option<std::path::PathBuf>,
    },
    /// Discard the job, its results and the saved setup
    Reset,
    /// Manage the progress session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Validate configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// End the current session; the next command starts with empty progress
    New,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Check configuration for errors and warnings
    Check,
}

/// Entry point for the CLI, called from main().
pub async fn run() -> Result<()> {
    // Load config early so we can respect the logging settings; fall back to
    // defaults if the config file is missing or unreadable.
    let logging_cfg = tgrelay::config::Config::load()
        .map(|c| c.logging)
        .unwrap_or_default();
    tgrelay::utils::logging::init_logging(&logging_cfg);

    let cli = Cli::parse();

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
        }
        Some(Commands::Version) => {
            cmd_version();
        }
        Some(Commands::Setup {
            source,
            target,
            start,
            keep_originals,
        }) => {
            setup::cmd_setup(source, target, start, keep_originals).await?;
        }
        Some(Commands::Forward { resume }) => {
            forward::cmd_forward(resume).await?;
        }
        Some(Commands::Status) => {
            status::cmd_status().await?;
        }
        Some(Commands::Senders) => {
            status::cmd_senders().await?;
        }
        Some(Commands::Export { output }) => {
            export::cmd_export(output).await?;
        }
        Some(Commands::Reset) => {
            session::cmd_reset().await?;
        }
        Some(Commands::Session { action }) => {
            session::cmd_session(action).await?;
        }
        Some(Commands::Config { action }) => {
            config::cmd_config(action).await?;
        }
    }

    Ok(())
}

/// Display version information
fn cmd_version() {
    println!("tgrelay {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Resumable, rate-limit aware bulk forwarding for the Telegram Bot API");
}
