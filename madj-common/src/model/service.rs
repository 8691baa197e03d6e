// madj-common/src/model/service.rs
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};

/// Lets the readiness wait ask whether the spawned process has already died.
pub trait ServiceProcess: Send + fmt::Debug {
    /// `Some(description)` once the process has exited, `None` while it is still running.
    fn exit_status(&mut self) -> Option<String>;
}

impl ServiceProcess for std::process::Child {
    fn exit_status(&mut self) -> Option<String> {
        match self.try_wait() {
            Ok(Some(status)) => Some(status.to_string()),
            Ok(None) => None,
            Err(e) => {
                tracing::debug!("try_wait on service process failed: {}", e);
                None
            }
        }
    }
}

/// A background service bound (or about to bind) to a loopback port. Lives only for the
/// duration of one launcher invocation; the port is what later invocations check.
#[derive(Debug)]
pub struct ServiceHandle {
    pub pid: u32,
    pub port: u16,
    pub launched_at: DateTime<Local>,
    pub log_path: PathBuf,
    process: Option<Box<dyn ServiceProcess>>,
}

impl ServiceHandle {
    pub fn new(pid: u32, port: u16, log_path: PathBuf) -> Self {
        Self {
            pid,
            port,
            launched_at: Local::now(),
            log_path,
            process: None,
        }
    }

    pub fn with_process(mut self, process: Box<dyn ServiceProcess>) -> Self {
        self.process = Some(process);
        self
    }

    /// Non-blocking; `None` when still running or when no process is attached.
    pub fn exit_status(&mut self) -> Option<String> {
        self.process.as_mut().and_then(|p| p.exit_status())
    }
}
