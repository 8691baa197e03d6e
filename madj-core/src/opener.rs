// madj-core/src/opener.rs
use std::process::{Command, Stdio};

use madj_common::error::{MadjError, Result};
use tracing::debug;

/// Points a client at the service URL. Callers treat failure as a warning.
pub trait ClientOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}

/// The platform's default browser. Spawns the opener and returns without waiting on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserOpener;

impl BrowserOpener {
    /// Program and arguments that hand `url` to the desktop's default handler.
    pub fn command_for(url: &str) -> (&'static str, Vec<String>) {
        if cfg!(target_os = "windows") {
            // `start` treats its first quoted argument as a window title.
            (
                "cmd",
                vec![
                    "/C".to_string(),
                    "start".to_string(),
                    String::new(),
                    url.to_string(),
                ],
            )
        } else if cfg!(target_os = "macos") {
            ("open", vec![url.to_string()])
        } else {
            ("xdg-open", vec![url.to_string()])
        }
    }
}

impl ClientOpener for BrowserOpener {
    fn open(&self, url: &str) -> Result<()> {
        let (program, args) = Self::command_for(url);
        debug!("Opening {} with {} {:?}", url, program, args);
        Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| MadjError::CommandExecError(format!("Failed to launch {program}: {e}")))
    }
}
