//! cask - declarative macOS application manifests

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cask_cli::cmd::{self, Settings};
use cask_cli::{Cli, Commands, Global};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        cmd::completions::completions(shell);
        return Ok(());
    }

    let settings = Settings::load(&Global::from(&cli))?;

    match cli.command {
        Commands::Validate { paths } => cmd::validate::validate(&settings, &paths),
        Commands::Info { cask, json } => cmd::info::info(&settings, &cask, json),
        Commands::Url { cask } => cmd::url::url(&settings, &cask),
        Commands::Fetch { casks } => cmd::fetch::fetch(&settings, &casks).await,
        Commands::Install { casks, force } => cmd::install::install(&settings, &casks, force).await,
        Commands::Uninstall { cask, zap } => cmd::uninstall::uninstall(&settings, &cask, zap),
        Commands::Zap { cask } => cmd::uninstall::zap(&settings, &cask),
        Commands::List => cmd::list::list(&settings),
        Commands::Search { query } => cmd::search::search(&settings, &query),
        Commands::Outdated { greedy, feeds } => {
            cmd::outdated::outdated(&settings, greedy, feeds).await
        }
        Commands::History { cask } => cmd::history::history(&settings, &cask),
        Commands::Hash { files, algo } => cmd::hash::hash(&files, algo),
        Commands::Completions { .. } => Ok(()),
    }
}
