// madj/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::env;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use madj_common::config::Config;
use madj_common::error::Result;
use madj_core::shortcut::{ShortcutDirs, ShortcutPublisher};
use madj_core::{EnvironmentProvisioner, InstallFlow, SourceSynchronizer, VenvToolchain};
use madj_net::HttpFetcher;

pub mod install;
pub mod launch;
pub mod status;

use crate::cli::install::InstallArgs;
use crate::cli::launch::LaunchArgs;
use crate::cli::status::Status;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "madj", bin_name = "madj")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Install root (defaults to MADJ_ROOT, then the platform data directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install or update the app files, its Python environment and the shortcut
    Install(InstallArgs),
    /// Start the app (unless it is already running) and open it in the browser
    Launch(LaunchArgs),
    /// Show what is installed and whether the app is running
    Status(Status),
}

impl Command {
    pub async fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Install(command) => command.run(config).await,
            Self::Launch(command) => command.run(config).await,
            Self::Status(command) => command.run(config).await,
        }
    }
}

/// The production install flow: HTTP fetches, a real venv toolchain, native shortcuts.
pub(crate) fn build_install_flow(
    config: &Config,
    offline: bool,
) -> Result<InstallFlow<HttpFetcher, VenvToolchain>> {
    let synchronizer = SourceSynchronizer::new(
        HttpFetcher::new()?,
        config.source_base_url.clone(),
        config.fallback_dir.clone(),
    )
    .offline(offline);
    let launcher_path = env::current_exe()?;
    Ok(InstallFlow::new(
        config.clone(),
        synchronizer,
        EnvironmentProvisioner::new(VenvToolchain::new(config.python.clone())),
        ShortcutPublisher::new(ShortcutDirs::from_config(config)),
        launcher_path,
    ))
}

pub(crate) fn headline(message: &str) {
    println!("{}{}", "==> ".bold().blue(), message.bold());
}

pub(crate) fn warning(message: &str) {
    eprintln!("{} {}", "Warning:".yellow(), message);
}
