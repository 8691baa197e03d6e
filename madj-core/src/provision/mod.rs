// madj-core/src/provision/mod.rs
//! Environment Provisioner: reuse the first usable environment in precedence order, else build
//! one at the canonical path and install the dependency manifest into it.

pub mod toolchain;

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use madj_common::error::{MadjError, Result};
use madj_common::model::{DependencyManifest, RuntimeEnvironment};
use tracing::{debug, info, warn};

use crate::fsutil::{atomic_write, remove_filesystem_artifact};
pub use toolchain::VenvToolchain;

const MANIFEST_FILENAME: &str = "madj-requirements.txt";

/// The external pieces the provisioner drives: a system interpreter, venv creation and the
/// package installer.
#[async_trait]
pub trait Toolchain: Send + Sync {
    async fn locate_system_interpreter(&self) -> Result<PathBuf>;
    async fn create_environment(&self, system_interpreter: &Path, env_path: &Path) -> Result<()>;
    async fn install_requirements(&self, interpreter: &Path, manifest_path: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionAction {
    Reused,
    Created,
}

#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub environment: RuntimeEnvironment,
    pub action: ProvisionAction,
    pub dependencies_installed: bool,
}

impl ProvisionReport {
    pub fn interpreter(&self) -> &Path {
        &self.environment.interpreter
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProvisionOptions {
    /// Re-run the dependency install on a reused environment.
    pub refresh_dependencies: bool,
}

pub struct EnvironmentProvisioner<T> {
    toolchain: T,
}

impl<T: Toolchain> EnvironmentProvisioner<T> {
    pub fn new(toolchain: T) -> Self {
        Self { toolchain }
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// `candidates` is in precedence order; the first entry is the canonical path.
    pub async fn ensure(
        &self,
        candidates: &[PathBuf],
        manifest: &DependencyManifest,
        options: ProvisionOptions,
    ) -> Result<ProvisionReport> {
        let canonical = candidates.first().ok_or_else(|| {
            MadjError::Config("no environment candidate paths configured".to_string())
        })?;

        if let Some(environment) = candidates
            .iter()
            .map(RuntimeEnvironment::at)
            .find(RuntimeEnvironment::is_reusable)
        {
            info!("Reusing environment at {}", environment.path.display());
            let mut dependencies_installed = false;
            if options.refresh_dependencies {
                info!("Refreshing dependencies in {}", environment.path.display());
                self.install(&environment, manifest).await?;
                dependencies_installed = true;
            }
            return Ok(ProvisionReport {
                environment,
                action: ProvisionAction::Reused,
                dependencies_installed,
            });
        }

        debug!(
            "No reusable environment among {:?}; creating {}",
            candidates,
            canonical.display()
        );
        let system_interpreter = self.toolchain.locate_system_interpreter().await?;
        info!(
            "Creating environment at {} with {}",
            canonical.display(),
            system_interpreter.display()
        );
        if let Some(parent) = canonical.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                MadjError::EnvironmentCreate(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let environment = RuntimeEnvironment::at(canonical);
        if let Err(e) = self.build(&system_interpreter, &environment, manifest).await {
            // An environment whose interpreter exists looks reusable to the next run, so a
            // half-provisioned one must not survive.
            warn!(
                "Removing incomplete environment {} after failed setup",
                environment.path.display()
            );
            remove_filesystem_artifact(&environment.path);
            return Err(e);
        }

        Ok(ProvisionReport {
            environment,
            action: ProvisionAction::Created,
            dependencies_installed: true,
        })
    }

    /// Create, confirm the interpreter, install. Any error leaves cleanup to the caller.
    async fn build(
        &self,
        system_interpreter: &Path,
        environment: &RuntimeEnvironment,
        manifest: &DependencyManifest,
    ) -> Result<()> {
        self.toolchain
            .create_environment(system_interpreter, &environment.path)
            .await?;
        if !environment.is_reusable() {
            return Err(MadjError::EnvironmentCreate(format!(
                "environment created but {} is missing",
                environment.interpreter.display()
            )));
        }
        self.install(environment, manifest).await
    }

    async fn install(
        &self,
        environment: &RuntimeEnvironment,
        manifest: &DependencyManifest,
    ) -> Result<()> {
        if manifest.is_empty() {
            debug!("Dependency manifest is empty; nothing to install");
            return Ok(());
        }
        let manifest_path = environment.path.join(MANIFEST_FILENAME);
        atomic_write(&manifest_path, manifest.to_requirements_txt().as_bytes())?;
        info!(
            "Installing {} requirement(s) into {}",
            manifest.requirements.len(),
            environment.path.display()
        );
        self.toolchain
            .install_requirements(&environment.interpreter, &manifest_path)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Creates venvs by writing a fake interpreter file; counts every call.
    #[derive(Default)]
    struct SpyToolchain {
        no_interpreter: bool,
        /// Writes the interpreter, then fails (venv without ensurepip).
        fail_create: bool,
        fail_install: bool,
        locate_calls: AtomicUsize,
        create_calls: AtomicUsize,
        install_calls: AtomicUsize,
    }

    #[async_trait]
    impl Toolchain for SpyToolchain {
        async fn locate_system_interpreter(&self) -> Result<PathBuf> {
            self.locate_calls.fetch_add(1, Ordering::SeqCst);
            if self.no_interpreter {
                return Err(MadjError::NoInterpreter("Python 3 is required".to_string()));
            }
            Ok(PathBuf::from("/usr/bin/python3"))
        }

        async fn create_environment(&self, _system: &Path, env_path: &Path) -> Result<()> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            let env = RuntimeEnvironment::at(env_path);
            fs::create_dir_all(env.interpreter.parent().unwrap())?;
            fs::write(&env.interpreter, b"")?;
            if self.fail_create {
                return Err(MadjError::EnvironmentCreate(
                    "ensurepip is not available".to_string(),
                ));
            }
            Ok(())
        }

        async fn install_requirements(&self, _interpreter: &Path, manifest: &Path) -> Result<()> {
            self.install_calls.fetch_add(1, Ordering::SeqCst);
            assert!(manifest.is_file());
            if self.fail_install {
                return Err(MadjError::DependencyInstall("pip exited 1".to_string()));
            }
            Ok(())
        }
    }

    fn fake_env(path: &Path) {
        let env = RuntimeEnvironment::at(path);
        fs::create_dir_all(env.interpreter.parent().unwrap()).unwrap();
        fs::write(&env.interpreter, b"").unwrap();
    }

    fn manifest() -> DependencyManifest {
        DependencyManifest::new(["streamlit", "pandas"])
    }

    #[tokio::test]
    async fn second_run_does_no_work() {
        let root = tempfile::tempdir().unwrap();
        let candidates = vec![root.path().join("venv"), root.path().join(".venv")];
        let provisioner = EnvironmentProvisioner::new(SpyToolchain::default());

        let first = provisioner
            .ensure(&candidates, &manifest(), ProvisionOptions::default())
            .await
            .unwrap();
        assert_eq!(first.action, ProvisionAction::Created);
        assert_eq!(first.environment.path, candidates[0]);

        let second = provisioner
            .ensure(&candidates, &manifest(), ProvisionOptions::default())
            .await
            .unwrap();
        assert_eq!(second.action, ProvisionAction::Reused);
        assert!(!second.dependencies_installed);

        let spy = provisioner.toolchain();
        assert_eq!(spy.locate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(spy.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(spy.install_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn legacy_environment_is_reused_instead_of_creating_canonical() {
        let root = tempfile::tempdir().unwrap();
        let candidates = vec![root.path().join("venv"), root.path().join(".venv")];
        fake_env(&candidates[1]);

        let provisioner = EnvironmentProvisioner::new(SpyToolchain::default());
        let report = provisioner
            .ensure(&candidates, &manifest(), ProvisionOptions::default())
            .await
            .unwrap();

        assert_eq!(report.environment.path, candidates[1]);
        assert!(!candidates[0].exists());
        assert_eq!(provisioner.toolchain().create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn canonical_wins_when_several_are_reusable() {
        let root = tempfile::tempdir().unwrap();
        let candidates = vec![root.path().join("venv"), root.path().join(".venv")];
        fake_env(&candidates[0]);
        fake_env(&candidates[1]);

        let provisioner = EnvironmentProvisioner::new(SpyToolchain::default());
        let report = provisioner
            .ensure(&candidates, &manifest(), ProvisionOptions::default())
            .await
            .unwrap();
        assert_eq!(report.environment.path, candidates[0]);
    }

    #[tokio::test]
    async fn directory_without_interpreter_is_rebuilt() {
        let root = tempfile::tempdir().unwrap();
        let candidates = vec![root.path().join("venv")];
        fs::create_dir_all(&candidates[0]).unwrap();

        let provisioner = EnvironmentProvisioner::new(SpyToolchain::default());
        let report = provisioner
            .ensure(&candidates, &manifest(), ProvisionOptions::default())
            .await
            .unwrap();
        assert_eq!(report.action, ProvisionAction::Created);
    }

    #[tokio::test]
    async fn missing_system_interpreter_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let provisioner = EnvironmentProvisioner::new(SpyToolchain {
            no_interpreter: true,
            ..Default::default()
        });
        let err = provisioner
            .ensure(&[root.path().join("venv")], &manifest(), ProvisionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MadjError::NoInterpreter(_)));
        assert_eq!(provisioner.toolchain().create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_install_is_fatal_and_leaves_nothing_reusable() {
        let root = tempfile::tempdir().unwrap();
        let candidates = vec![root.path().join("venv")];
        let provisioner = EnvironmentProvisioner::new(SpyToolchain {
            fail_install: true,
            ..Default::default()
        });
        let err = provisioner
            .ensure(&candidates, &manifest(), ProvisionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MadjError::DependencyInstall(_)));
        assert!(!RuntimeEnvironment::at(&candidates[0]).is_reusable());
    }

    #[tokio::test]
    async fn failed_creation_is_fatal_and_partial_environment_is_not_reused() {
        let root = tempfile::tempdir().unwrap();
        let candidates = vec![root.path().join("venv")];

        let broken = EnvironmentProvisioner::new(SpyToolchain {
            fail_create: true,
            ..Default::default()
        });
        let err = broken
            .ensure(&candidates, &manifest(), ProvisionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MadjError::EnvironmentCreate(_)));
        assert!(!RuntimeEnvironment::at(&candidates[0]).is_reusable());
        assert_eq!(broken.toolchain().install_calls.load(Ordering::SeqCst), 0);

        let fixed = EnvironmentProvisioner::new(SpyToolchain::default());
        let report = fixed
            .ensure(&candidates, &manifest(), ProvisionOptions::default())
            .await
            .unwrap();
        assert_eq!(report.action, ProvisionAction::Created);
        assert!(report.dependencies_installed);
        assert_eq!(fixed.toolchain().create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_reinstalls_into_reused_environment() {
        let root = tempfile::tempdir().unwrap();
        let candidates = vec![root.path().join("venv")];
        fake_env(&candidates[0]);

        let provisioner = EnvironmentProvisioner::new(SpyToolchain::default());
        let report = provisioner
            .ensure(
                &candidates,
                &manifest(),
                ProvisionOptions {
                    refresh_dependencies: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(report.action, ProvisionAction::Reused);
        assert!(report.dependencies_installed);
        assert_eq!(provisioner.toolchain().install_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provisioner.toolchain().create_calls.load(Ordering::SeqCst), 0);
    }
}
