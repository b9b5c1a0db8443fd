pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

/// Commands that need the configuration and a price source.
pub enum AppCommand {
    Returns { tracker: Option<String> },
    Summary { tracker: Option<String> },
    History { tracker: Option<String>, last: Option<usize> },
}

impl AppCommand {
    fn tracker(&self) -> Option<&str> {
        match self {
            AppCommand::Returns { tracker }
            | AppCommand::Summary { tracker }
            | AppCommand::History { tracker, .. } => tracker.as_deref(),
        }
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Return tracker starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = providers::build_provider(&config)?;
    let today = chrono::Local::now().date_naive();
    let trackers = config.select_trackers(command.tracker())?;

    match command {
        AppCommand::Returns { .. } => {
            cli::for_each_tracker(&trackers, provider.as_ref(), today, cli::returns::render).await
        }
        AppCommand::Summary { .. } => cli::summary::run(&trackers, provider.as_ref(), today).await,
        AppCommand::History { last, .. } => {
            cli::for_each_tracker(&trackers, provider.as_ref(), today, |loaded| {
                cli::history::render(loaded, last)
            })
            .await
        }
    }
}
