//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Taleweaver - interactive story generation backend
#[derive(Parser, Debug)]
#[command(name = "taleweaver")]
#[command(about = "Interactive story generation backend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./taleweaver.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit JSON logs
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve flows over HTTP
    Serve {
        /// Bind address, overriding `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Bind port, overriding `server.port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// List registered flow names
    Flows,

    /// Execute one flow and print the response envelope
    Run {
        /// Flow name (e.g., descriptionFlow)
        flow: String,

        /// Flow input as JSON
        #[arg(long, default_value = "{}")]
        input: String,

        /// Session to run against
        #[arg(long)]
        session: Option<String>,
    },
}
