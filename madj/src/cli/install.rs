// madj/src/cli/install.rs
use clap::Args;
use madj_common::config::Config;
use madj_common::error::Result;
use madj_core::{InstallOptions, ProvisionAction};
use tracing::instrument;

use super::{build_install_flow, headline, launch, warning};

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Start the app once the install finishes
    #[arg(long)]
    launch: bool,

    /// Do not create or refresh the desktop/menu shortcut
    #[arg(long)]
    no_shortcut: bool,

    /// Reinstall the Python dependencies even if the environment already exists
    #[arg(long)]
    refresh_deps: bool,

    /// Do not download anything; use local copies of the app files only
    #[arg(long)]
    offline: bool,
}

impl InstallArgs {
    #[instrument(skip(self, config), fields(root = %config.install_root().display()))]
    pub async fn run(&self, config: &Config) -> Result<()> {
        let flow = build_install_flow(config, self.offline)?;

        headline(&format!(
            "Installing Market Adjuster into {}",
            config.install_root().display()
        ));
        let report = flow
            .run(InstallOptions {
                sync_sources: true,
                publish_shortcut: !self.no_shortcut,
                refresh_dependencies: self.refresh_deps,
            })
            .await?;

        if report.reconciliation.sync.as_ref().is_some_and(|s| s.degraded()) {
            warning("some app files could not be updated; the existing copies were kept");
        }
        let provision = &report.reconciliation.provision;
        match provision.action {
            ProvisionAction::Created => headline(&format!(
                "Created Python environment at {}",
                provision.environment.path.display()
            )),
            ProvisionAction::Reused => headline(&format!(
                "Using existing Python environment at {}",
                provision.environment.path.display()
            )),
        }
        if let Some(shortcut) = &report.shortcut {
            headline(&format!("Shortcut: {}", shortcut.path.display()));
            for path in &shortcut.stuck_legacy {
                warning(&format!("could not remove old launcher {}", path.display()));
            }
        }
        headline(report.completion_message());

        if self.launch {
            launch::launch_with(config, provision.interpreter().to_path_buf()).await?;
        }
        Ok(())
    }
}
