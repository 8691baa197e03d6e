// madj/src/cli/launch.rs
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use madj_common::config::Config;
use madj_common::error::{MadjError, Result};
use madj_common::model::LaunchOutcome;
use madj_core::{
    BrowserOpener, LaunchFlow, LaunchRequest, ProvisionOptions, ReadinessWaiter,
    StreamlitLauncher, TcpPortProbe,
};
use tracing::{debug, instrument};

use super::{build_install_flow, headline, warning};

#[derive(Debug, Args)]
pub struct LaunchArgs {
    /// Skip updating the app files before starting
    #[arg(long)]
    offline: bool,

    /// Do not open a browser window
    #[arg(long)]
    no_browser: bool,

    /// Seconds to wait for the app to start listening
    #[arg(long, value_name = "N")]
    wait_secs: Option<u64>,

    /// Port to serve the app on
    #[arg(long, value_name = "P")]
    port: Option<u16>,
}

impl LaunchArgs {
    fn effective_config(&self, config: &Config) -> Result<Config> {
        let mut config = config.clone();
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(secs) = self.wait_secs {
            config.readiness_budget = Duration::from_secs(secs);
        }
        if self.no_browser {
            config.open_browser = false;
        }
        config.validate()?;
        Ok(config)
    }

    #[instrument(skip(self, config), fields(port = config.port))]
    pub async fn run(&self, config: &Config) -> Result<()> {
        let config = self.effective_config(config)?;
        let sync = config.sync_on_launch && !self.offline;
        debug!("Reconciling before launch (sync: {})", sync);

        // Provisioning errors stop here; nothing is launched against an unusable environment.
        let reconciliation = build_install_flow(&config, self.offline)?
            .reconcile(sync, ProvisionOptions::default())
            .await?;

        launch_with(&config, reconciliation.provision.interpreter().to_path_buf()).await
    }
}

/// Probe, launch, wait and open for an already provisioned interpreter.
pub(crate) async fn launch_with(config: &Config, interpreter: PathBuf) -> Result<()> {
    let flow = LaunchFlow::new(
        TcpPortProbe::new(config.probe_timeout),
        StreamlitLauncher,
        BrowserOpener,
        ReadinessWaiter::new(config.readiness_budget, config.poll_interval),
    );
    let outcome = flow
        .run(&LaunchRequest::from_config(config, interpreter))
        .await;

    match &outcome {
        LaunchOutcome::StartFailed { .. } => return Err(MadjError::Launch(outcome.to_string())),
        LaunchOutcome::StartedTimedOut { .. } => {
            warning(&outcome.to_string());
            warning("the browser was opened anyway; reload it once the app finishes starting");
        }
        LaunchOutcome::AlreadyRunning { .. } | LaunchOutcome::StartedAndReady { .. } => {
            headline(&outcome.to_string());
        }
    }
    Ok(())
}
