// madj/src/cli/status.rs
use clap::Args;
use colored::*;
use madj_common::config::Config;
use madj_common::error::Result;
use madj_common::model::{InstallationState, Mode, RuntimeEnvironment};
use madj_core::{latest_log, PortProbe, TcpPortProbe};

#[derive(Debug, Args)]
pub struct Status;

fn row(label: &str, value: impl std::fmt::Display) {
    println!("{:>12}  {}", label.bold(), value);
}

impl Status {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let state = InstallationState::read(config);
        row("root", state.root.display());
        row(
            "app",
            match state.mode() {
                Mode::Update => format!("installed ({})", state.marker_path.display()).green(),
                Mode::Fresh => "not installed".yellow(),
            },
        );

        let environment = config
            .environment_candidates()
            .into_iter()
            .map(RuntimeEnvironment::at)
            .find(RuntimeEnvironment::is_reusable);
        row(
            "environment",
            match environment {
                Some(env) => env.path.display().to_string().green(),
                None => "none".yellow(),
            },
        );

        let running = TcpPortProbe::new(config.probe_timeout)
            .is_open(config.port)
            .await;
        row(
            "service",
            if running {
                format!("running at {}", config.service_url()).green()
            } else {
                format!("not running (port {})", config.port).dimmed()
            },
        );

        row(
            "last log",
            latest_log(&config.logs_dir())
                .map_or_else(|| "none".to_string(), |p| p.display().to_string()),
        );
        Ok(())
    }
}
