// madj-core/src/provision/toolchain.rs
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use madj_common::error::{MadjError, Result};
use tracing::{debug, info, warn};

use super::Toolchain;
use crate::process::{output_tail, run_command_async};

#[cfg(windows)]
const INTERPRETER_NAMES: &[&str] = &["python3", "python", "py"];
#[cfg(not(windows))]
const INTERPRETER_NAMES: &[&str] = &["python3", "python"];

const NO_PYTHON_HELP: &str = "Python 3 is required but was not found. Install Python 3.9 or newer \
from https://www.python.org/downloads/ (on Windows, tick \"Add python.exe to PATH\"), \
or point MADJ_PYTHON at an existing python executable.";

/// Real toolchain: a system Python 3, `python -m venv`, and pip.
#[derive(Debug, Clone, Default)]
pub struct VenvToolchain {
    explicit_interpreter: Option<PathBuf>,
}

impl VenvToolchain {
    pub fn new(explicit_interpreter: Option<PathBuf>) -> Self {
        Self {
            explicit_interpreter,
        }
    }

    async fn is_python3(&self, candidate: &Path) -> bool {
        match run_command_async(candidate, ["--version"], None).await {
            Ok(out) if out.status.success() => {
                // Python 2 printed its version on stderr.
                let text = format!(
                    "{}{}",
                    String::from_utf8_lossy(&out.stdout),
                    String::from_utf8_lossy(&out.stderr)
                );
                let is_3 = text.trim().starts_with("Python 3");
                debug!("{} reports '{}'", candidate.display(), text.trim());
                is_3
            }
            Ok(out) => {
                debug!(
                    "{} --version exited with {}",
                    candidate.display(),
                    out.status
                );
                false
            }
            Err(e) => {
                debug!("Could not run {}: {}", candidate.display(), e);
                false
            }
        }
    }
}

#[async_trait]
impl Toolchain for VenvToolchain {
    async fn locate_system_interpreter(&self) -> Result<PathBuf> {
        if let Some(path) = &self.explicit_interpreter {
            if path.is_file() && self.is_python3(path).await {
                debug!("Using interpreter from MADJ_PYTHON: {}", path.display());
                return Ok(path.clone());
            }
            return Err(MadjError::NoInterpreter(format!(
                "MADJ_PYTHON points to {}, which is not a working Python 3 interpreter. {NO_PYTHON_HELP}",
                path.display()
            )));
        }

        for name in INTERPRETER_NAMES {
            debug!("Searching PATH for '{name}'");
            match which::which(name) {
                Ok(path) if self.is_python3(&path).await => {
                    debug!("Found system interpreter: {}", path.display());
                    return Ok(path);
                }
                Ok(path) => debug!("{} is not Python 3; skipping", path.display()),
                Err(e) => debug!("'{name}' not on PATH: {e}"),
            }
        }
        Err(MadjError::NoInterpreter(NO_PYTHON_HELP.to_string()))
    }

    async fn create_environment(&self, system_interpreter: &Path, env_path: &Path) -> Result<()> {
        let mut args = vec!["-m".to_string(), "venv".to_string()];
        if env_path.exists() {
            // Leftover directory without an interpreter; start it over.
            args.push("--clear".to_string());
        }
        args.push(env_path.to_string_lossy().into_owned());

        let output = run_command_async(system_interpreter, &args, None).await?;
        if !output.status.success() {
            return Err(MadjError::EnvironmentCreate(format!(
                "'{} -m venv {}' failed ({}): {}",
                system_interpreter.display(),
                env_path.display(),
                output.status,
                output_tail(&output, 5)
            )));
        }
        info!("Created environment at {}", env_path.display());
        Ok(())
    }

    async fn install_requirements(&self, interpreter: &Path, manifest_path: &Path) -> Result<()> {
        let upgrade = run_command_async(
            interpreter,
            ["-m", "pip", "install", "--upgrade", "pip"],
            None,
        )
        .await;
        match upgrade {
            Ok(out) if out.status.success() => debug!("pip upgraded"),
            Ok(out) => warn!(
                "pip self-upgrade failed ({}); continuing with the bundled pip",
                out.status
            ),
            Err(e) => warn!("pip self-upgrade could not run: {}", e),
        }

        let manifest_arg = manifest_path.to_string_lossy().into_owned();
        let output = run_command_async(
            interpreter,
            [
                "-m",
                "pip",
                "install",
                "--disable-pip-version-check",
                "-r",
                manifest_arg.as_str(),
            ],
            None,
        )
        .await
        .map_err(|e| MadjError::DependencyInstall(e.to_string()))?;

        if !output.status.success() {
            return Err(MadjError::DependencyInstall(format!(
                "pip install -r {} failed ({}): {}",
                manifest_path.display(),
                output.status,
                output_tail(&output, 10)
            )));
        }
        info!("Dependencies installed from {}", manifest_path.display());
        Ok(())
    }
}
