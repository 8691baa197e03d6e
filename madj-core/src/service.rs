// madj-core/src/service.rs
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::Local;
use madj_common::config::LOOPBACK_HOST;
use madj_common::error::{MadjError, Result};
use madj_common::model::ServiceHandle;
use tracing::{debug, info};

#[cfg(windows)]
const DETACHED_PROCESS: u32 = 0x0000_0008;
#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

/// Everything needed to start the served app once.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub interpreter: PathBuf,
    pub app_entry: PathBuf,
    pub work_dir: PathBuf,
    pub port: u16,
    pub logs_dir: PathBuf,
}

/// Starts the served application in the background. Callers probe the port first; the
/// launcher does not.
pub trait ServiceLauncher: Send + Sync {
    fn launch(&self, spec: &LaunchSpec) -> Result<ServiceHandle>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StreamlitLauncher;

impl StreamlitLauncher {
    pub fn args(spec: &LaunchSpec) -> Vec<String> {
        vec![
            "-m".to_string(),
            "streamlit".to_string(),
            "run".to_string(),
            spec.app_entry.to_string_lossy().into_owned(),
            "--server.port".to_string(),
            spec.port.to_string(),
            "--server.address".to_string(),
            LOOPBACK_HOST.to_string(),
            "--server.headless".to_string(),
            "true".to_string(),
            "--browser.gatherUsageStats".to_string(),
            "false".to_string(),
        ]
    }
}

impl ServiceLauncher for StreamlitLauncher {
    fn launch(&self, spec: &LaunchSpec) -> Result<ServiceHandle> {
        if !spec.app_entry.is_file() {
            return Err(MadjError::Launch(format!(
                "application entry {} does not exist",
                spec.app_entry.display()
            )));
        }

        let (log_path, mut log_file) = create_log_file(&spec.logs_dir)?;
        let args = Self::args(spec);
        writeln!(
            log_file,
            "# madj launch at {}: {} {}",
            Local::now().to_rfc3339(),
            spec.interpreter.display(),
            args.join(" ")
        )?;
        let stderr_file = log_file.try_clone()?;

        let mut cmd = Command::new(&spec.interpreter);
        cmd.args(&args)
            .current_dir(&spec.work_dir)
            .env("PYTHONUNBUFFERED", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(stderr_file));
        detach(&mut cmd);

        let child = cmd.spawn().map_err(|e| {
            MadjError::Launch(format!(
                "failed to start {}: {e}",
                spec.interpreter.display()
            ))
        })?;
        let pid = child.id();
        info!(
            "Started served app (pid {}) on port {}, logging to {}",
            pid,
            spec.port,
            log_path.display()
        );

        Ok(ServiceHandle::new(pid, spec.port, log_path).with_process(Box::new(child)))
    }
}

/// New process group, so the service survives the launcher's terminal closing.
#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) {}

/// `<logs>/<YYYYmmdd-HHMMSS>.log`, or `...-N.log` when that name is taken. Created with
/// `create_new`, so two launchers racing never share a file.
pub fn create_log_file(logs_dir: &Path) -> Result<(PathBuf, File)> {
    fs::create_dir_all(logs_dir)?;
    let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();

    for attempt in 0..1000u32 {
        let name = if attempt == 0 {
            format!("{stamp}.log")
        } else {
            format!("{stamp}-{attempt}.log")
        };
        let path = logs_dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => {
                debug!("Created launch log {}", path.display());
                return Ok((path, file));
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(MadjError::Launch(format!(
        "could not allocate a log file name in {}",
        logs_dir.display()
    )))
}

/// Most recent `*.log` in the logs directory, by file name (names sort chronologically).
pub fn latest_log(logs_dir: &Path) -> Option<PathBuf> {
    fs::read_dir(logs_dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "log"))
        .max_by(|a, b| a.file_name().cmp(&b.file_name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_files_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let (a, _) = create_log_file(dir.path()).unwrap();
        let (b, _) = create_log_file(dir.path()).unwrap();
        let (c, _) = create_log_file(dir.path()).unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn latest_log_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("20240101-090000.log"), "").unwrap();
        fs::write(dir.path().join("20240301-090000.log"), "").unwrap();
        fs::write(dir.path().join("madj.log.2099-01-01"), "").unwrap();
        assert_eq!(
            latest_log(dir.path()),
            Some(dir.path().join("20240301-090000.log"))
        );
    }

    #[test]
    fn streamlit_binds_loopback_on_requested_port() {
        let spec = LaunchSpec {
            interpreter: PathBuf::from("python"),
            app_entry: PathBuf::from("app/market_condition_app.py"),
            work_dir: PathBuf::from("app"),
            port: 8502,
            logs_dir: PathBuf::from("logs"),
        };
        let args = StreamlitLauncher::args(&spec).join(" ");
        assert!(args.starts_with("-m streamlit run app/market_condition_app.py"));
        assert!(args.contains("--server.port 8502"));
        assert!(args.contains("--server.address 127.0.0.1"));
    }

    #[test]
    fn missing_entry_fails_before_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let spec = LaunchSpec {
            interpreter: PathBuf::from("python"),
            app_entry: dir.path().join("missing.py"),
            work_dir: dir.path().to_path_buf(),
            port: 8501,
            logs_dir: dir.path().join("logs"),
        };
        assert!(matches!(
            StreamlitLauncher.launch(&spec),
            Err(MadjError::Launch(_))
        ));
        assert!(!dir.path().join("logs").exists());
    }

    #[cfg(unix)]
    #[test]
    fn output_lands_in_launch_log() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("app.py");
        fs::write(&entry, "").unwrap();
        let spec = LaunchSpec {
            // `sh -m ...` fails immediately with a usage error on stderr.
            interpreter: PathBuf::from("sh"),
            app_entry: entry,
            work_dir: dir.path().to_path_buf(),
            port: 8501,
            logs_dir: dir.path().join("logs"),
        };
        let mut handle = StreamlitLauncher.launch(&spec).unwrap();
        assert_eq!(handle.port, 8501);

        let mut exited = None;
        for _ in 0..100 {
            exited = handle.exit_status();
            if exited.is_some() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(exited.is_some());
        let log = fs::read_to_string(&handle.log_path).unwrap();
        assert!(log.starts_with("# madj launch at"));
    }
}
