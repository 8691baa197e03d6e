// madj-core/src/flow/launch.rs
//! Probe, launch, wait, open. The probe always comes first: a port that is already open means
//! the service is up and nothing gets spawned.

use std::path::PathBuf;

use madj_common::config::{Config, LOOPBACK_HOST};
use madj_common::model::LaunchOutcome;
use tracing::{debug, error, info, warn};

use crate::opener::ClientOpener;
use crate::probe::PortProbe;
use crate::readiness::{Readiness, ReadinessWaiter};
use crate::service::{LaunchSpec, ServiceLauncher};

#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub spec: LaunchSpec,
    pub open_client: bool,
}

impl LaunchRequest {
    pub fn from_config(config: &Config, interpreter: PathBuf) -> Self {
        Self {
            spec: LaunchSpec {
                interpreter,
                app_entry: config.app_entry_path(),
                work_dir: config.app_dir(),
                port: config.port,
                logs_dir: config.logs_dir(),
            },
            open_client: config.open_browser,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{LOOPBACK_HOST}:{}", self.spec.port)
    }
}

pub struct LaunchFlow<P, L, O> {
    probe: P,
    launcher: L,
    opener: O,
    waiter: ReadinessWaiter,
}

impl<P, L, O> LaunchFlow<P, L, O>
where
    P: PortProbe,
    L: ServiceLauncher,
    O: ClientOpener,
{
    pub fn new(probe: P, launcher: L, opener: O, waiter: ReadinessWaiter) -> Self {
        Self {
            probe,
            launcher,
            opener,
            waiter,
        }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    pub async fn run(&self, request: &LaunchRequest) -> LaunchOutcome {
        let url = request.url();
        let port = request.spec.port;

        let outcome = if self.probe.is_open(port).await {
            info!("Port {} already open; not starting a second instance", port);
            LaunchOutcome::AlreadyRunning { url }
        } else {
            self.start_and_wait(request, url).await
        };

        if outcome.should_open_client() && request.open_client {
            debug!("Opening client at {}", outcome.url());
            if let Err(e) = self.opener.open(outcome.url()) {
                warn!("Could not open a browser ({}); visit {} manually", e, outcome.url());
            }
        }
        outcome
    }

    async fn start_and_wait(&self, request: &LaunchRequest, url: String) -> LaunchOutcome {
        let mut handle = match self.launcher.launch(&request.spec) {
            Ok(handle) => handle,
            Err(e) => {
                error!("Launch failed: {}", e);
                return LaunchOutcome::StartFailed {
                    url,
                    reason: e.to_string(),
                    log_path: None,
                };
            }
        };

        info!(
            "Waiting up to {:?} for {} (pid {})",
            self.waiter.budget(),
            url,
            handle.pid
        );
        match self.waiter.wait(&self.probe, &mut handle).await {
            Readiness::Ready { elapsed, .. } => LaunchOutcome::StartedAndReady {
                url,
                pid: handle.pid,
                log_path: handle.log_path,
                elapsed,
            },
            Readiness::TimedOut { elapsed, .. } => LaunchOutcome::StartedTimedOut {
                url,
                pid: handle.pid,
                log_path: handle.log_path,
                waited: elapsed,
            },
            Readiness::Exited { status, .. } => LaunchOutcome::StartFailed {
                url,
                reason: format!(
                    "the app exited ({status}) before port {} opened",
                    handle.port
                ),
                log_path: Some(handle.log_path),
            },
        }
    }
}
