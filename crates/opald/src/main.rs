//! opald: the Opal AM service daemon.
//!
//! Serves the standard AM protocol and, when enabled, the
//! distributed-scheduling AM protocol on one HTTP endpoint.
//!
//! # Usage
//!
//! ```text
//! opald standalone --config /etc/opal/opal.toml --port 8030
//! ```

mod standalone;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "opald", about = "Opal AM service daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run with an in-memory scheduler seeded from the config file.
    Standalone {
        /// Path to opal.toml.
        #[arg(long)]
        config: PathBuf,

        /// Override `server.port`.
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,opald=debug,opal=debug"))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Standalone { config, port } => standalone::run_standalone(config, port).await,
    }
}
