// madj-core/src/flow/install.rs
use std::path::PathBuf;

use madj_common::config::Config;
use madj_common::error::Result;
use madj_common::model::{DependencyManifest, InstallationState, Mode, ShortcutEntry};
use tracing::{debug, info, warn};

use crate::provision::{EnvironmentProvisioner, ProvisionOptions, ProvisionReport, Toolchain};
use crate::shortcut::{PublishReport, ShortcutPublisher};
use crate::sync::{SourceFetcher, SourceSynchronizer, SyncReport};

#[derive(Debug, Clone, Copy)]
pub struct InstallOptions {
    pub sync_sources: bool,
    pub publish_shortcut: bool,
    pub refresh_dependencies: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            sync_sources: true,
            publish_shortcut: true,
            refresh_dependencies: false,
        }
    }
}

/// Files and environment brought to their reconciled state. `sync` is `None` when the caller
/// skipped synchronization.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub state: InstallationState,
    pub sync: Option<SyncReport>,
    pub provision: ProvisionReport,
}

impl Reconciliation {
    pub fn mode(&self) -> Mode {
        self.state.mode()
    }
}

#[derive(Debug, Clone)]
pub struct InstallReport {
    pub reconciliation: Reconciliation,
    pub shortcut: Option<PublishReport>,
}

impl InstallReport {
    pub fn mode(&self) -> Mode {
        self.reconciliation.mode()
    }

    pub fn completion_message(&self) -> &'static str {
        match self.mode() {
            Mode::Fresh => "Fresh install complete",
            Mode::Update => "Update complete",
        }
    }
}

pub struct InstallFlow<F, T> {
    config: Config,
    synchronizer: SourceSynchronizer<F>,
    provisioner: EnvironmentProvisioner<T>,
    publisher: ShortcutPublisher,
    launcher_path: PathBuf,
}

impl<F, T> InstallFlow<F, T>
where
    F: SourceFetcher,
    T: Toolchain,
{
    /// `launcher_path` is the executable the published shortcut re-runs.
    pub fn new(
        config: Config,
        synchronizer: SourceSynchronizer<F>,
        provisioner: EnvironmentProvisioner<T>,
        publisher: ShortcutPublisher,
        launcher_path: PathBuf,
    ) -> Self {
        Self {
            config,
            synchronizer,
            provisioner,
            publisher,
            launcher_path,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn provisioner(&self) -> &EnvironmentProvisioner<T> {
        &self.provisioner
    }

    pub fn synchronizer(&self) -> &SourceSynchronizer<F> {
        &self.synchronizer
    }

    /// Sync (when asked) then provision. Neither step looks at the Mode.
    pub async fn reconcile(
        &self,
        sync_sources: bool,
        options: ProvisionOptions,
    ) -> Result<Reconciliation> {
        let state = InstallationState::read(&self.config);
        debug!(
            "Install root {} ({})",
            state.root.display(),
            state.mode()
        );

        let sync = if sync_sources {
            let report = self
                .synchronizer
                .sync(self.config.install_root(), &self.config.source_resources())
                .await?;
            for warning in report.warnings() {
                warn!("{}", warning);
            }
            Some(report)
        } else {
            debug!("Skipping source synchronization");
            None
        };

        let manifest =
            DependencyManifest::load_or(&self.config.requirements_path(), &self.config.requirements)?;
        let provision = self
            .provisioner
            .ensure(&self.config.environment_candidates(), &manifest, options)
            .await?;

        Ok(Reconciliation {
            state,
            sync,
            provision,
        })
    }

    pub async fn run(&self, options: InstallOptions) -> Result<InstallReport> {
        let reconciliation = self
            .reconcile(
                options.sync_sources,
                ProvisionOptions {
                    refresh_dependencies: options.refresh_dependencies,
                },
            )
            .await?;

        let shortcut = if options.publish_shortcut {
            Some(self.publisher.publish(&self.shortcut_entry())?)
        } else {
            debug!("Shortcut publishing disabled");
            None
        };

        let report = InstallReport {
            reconciliation,
            shortcut,
        };
        info!("{}", report.completion_message());
        Ok(report)
    }

    fn shortcut_entry(&self) -> ShortcutEntry {
        let icon = self.config.icon_path();
        ShortcutEntry::for_launcher(
            self.launcher_path.clone(),
            self.config.install_root().to_path_buf(),
            icon.is_file().then_some(icon),
        )
    }
}
