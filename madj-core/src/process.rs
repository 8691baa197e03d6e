// madj-core/src/process.rs
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Output, Stdio};

use madj_common::error::{MadjError, Result};
use tokio::process::Command;
use tracing::{debug, error};

/// Runs an external command to completion and captures its output. A non-zero exit is not an
/// error here; callers decide what a failed status means for them.
pub async fn run_command_async<S, I>(program: &Path, args: I, cwd: Option<&Path>) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
    debug!(
        "Running command: {} {:?} (cwd: {:?})",
        program.display(),
        args,
        cwd
    );

    let mut cmd = Command::new(program);
    cmd.args(&args);
    cmd.kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.stdin(Stdio::null()); // Prevent hanging on stdin

    match cmd.output().await {
        Ok(output) => {
            if !output.status.success() {
                debug!("Command failed with status: {}", output.status);
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                if !stdout.trim().is_empty() {
                    debug!("Stdout:\n{}", stdout.trim());
                }
                if !stderr.trim().is_empty() {
                    debug!("Stderr:\n{}", stderr.trim());
                }
            } else {
                debug!("Command finished successfully.");
            }
            Ok(output)
        }
        Err(e) => {
            error!("Failed to execute {}: {}", program.display(), e);
            Err(MadjError::CommandExecError(format!(
                "{}: {e}",
                program.display()
            )))
        }
    }
}

/// Last `max_lines` non-empty lines of stderr (falling back to stdout), for error messages.
pub fn output_tail(output: &Output, max_lines: usize) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let text = if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout).into_owned()
    } else {
        stderr.into_owned()
    };
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
