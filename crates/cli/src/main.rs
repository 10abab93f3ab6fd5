//! shellbuddy CLI entry point.
//!
//! Commands:
//! - `run`:    start the coaching daemon
//! - `tip`:    ask the expert tier a question
//! - `scan`:   match a command against the rule corpus
//! - `draft`:  show the latest drafted commit message
//! - `status`: show config, paths, and backend availability

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "shellbuddy",
    about = "Ambient shell coaching daemon",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the data directory (default: ~/.shellbuddy)
    #[arg(long, global = true)]
    dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the coaching daemon
    Run,

    /// Ask the expert tier a question (requires a running daemon)
    Tip {
        /// The question, e.g. `shellbuddy tip "undo last commit"`
        query: Vec<String>,

        /// Seconds to wait for the answer
        #[arg(short, long, default_value_t = 120)]
        timeout: u64,
    },

    /// Match a command against the rule corpus
    Scan {
        /// The command text to scan
        command: Vec<String>,
    },

    /// Show the latest drafted commit message
    Draft,

    /// Show config, paths, and backend availability
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let paths = match cli.dir {
        Some(dir) => shellbuddy_config::Paths::at(dir),
        None => shellbuddy_config::Paths::resolve(),
    };

    match cli.command {
        Commands::Run => commands::run::run(paths).await?,
        Commands::Tip { query, timeout } => {
            commands::tip::run(paths, query.join(" "), timeout).await?
        }
        Commands::Scan { command } => commands::scan::run(paths, command.join(" "))?,
        Commands::Draft => commands::draft::run(paths)?,
        Commands::Status => commands::status::run(paths).await?,
    }

    Ok(())
}
