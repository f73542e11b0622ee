use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod daemon;
mod replay;
mod score;

#[derive(Parser)]
#[command(name = "facelock", version, about = "FaceLock landmark face lock")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a recorded landmark stream (JSON Lines) through the engine
    Replay {
        /// File with one frame, register or clear event per line
        path: PathBuf,
        /// Override the authorization distance threshold
        #[arg(long)]
        threshold: Option<f32>,
        /// Override the distance-to-percentage scale
        #[arg(long)]
        scale: Option<f32>,
    },
    /// Score two landmark sets (JSON arrays of points) against each other
    Score {
        reference: PathBuf,
        current: PathBuf,
        #[arg(long)]
        scale: Option<f32>,
    },
    /// Register the face currently in front of the daemon's camera feed
    Register {
        /// Use the session bus instead of the system bus
        #[arg(long)]
        session: bool,
    },
    /// Clear the daemon's registered profile
    Clear {
        #[arg(long)]
        session: bool,
    },
    /// Show daemon status
    Status {
        #[arg(long)]
        session: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            path,
            threshold,
            scale,
        } => replay::run(&path, threshold, scale),
        Command::Score {
            reference,
            current,
            scale,
        } => score::run(&reference, &current, scale),
        Command::Register { session } => daemon::register(session).await,
        Command::Clear { session } => daemon::clear(session).await,
        Command::Status { session } => daemon::status(session).await,
    }
}
