use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use retrack::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for retrack::AppCommand {
    fn from(cmd: Commands) -> retrack::AppCommand {
        match cmd {
            Commands::Returns { tracker } => retrack::AppCommand::Returns { tracker },
            Commands::Summary { tracker } => retrack::AppCommand::Summary { tracker },
            Commands::History { tracker, last } => retrack::AppCommand::History { tracker, last },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display per-ticker returns and bucket averages against the benchmark
    Returns {
        /// Only show the tracker with this name
        #[arg(short, long)]
        tracker: Option<String>,
    },
    /// Display what the invested capital is worth now, per tracker
    Summary {
        #[arg(short, long)]
        tracker: Option<String>,
    },
    /// Display the daily portfolio value next to the benchmark
    History {
        #[arg(short, long)]
        tracker: Option<String>,
        /// Only show the most recent N days
        #[arg(short, long)]
        last: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => retrack::cli::setup::setup_at_path(path),
            None => retrack::cli::setup::setup(),
        },
        Some(cmd) => retrack::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
