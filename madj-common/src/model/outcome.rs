// madj-common/src/model/outcome.rs
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Terminal result of one launch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    AlreadyRunning {
        url: String,
    },
    StartedAndReady {
        url: String,
        pid: u32,
        log_path: PathBuf,
        elapsed: Duration,
    },
    StartedTimedOut {
        url: String,
        pid: u32,
        log_path: PathBuf,
        waited: Duration,
    },
    StartFailed {
        url: String,
        reason: String,
        log_path: Option<PathBuf>,
    },
}

impl LaunchOutcome {
    pub fn url(&self) -> &str {
        match self {
            Self::AlreadyRunning { url }
            | Self::StartedAndReady { url, .. }
            | Self::StartedTimedOut { url, .. }
            | Self::StartFailed { url, .. } => url,
        }
    }

    pub fn log_path(&self) -> Option<&PathBuf> {
        match self {
            Self::AlreadyRunning { .. } => None,
            Self::StartedAndReady { log_path, .. } | Self::StartedTimedOut { log_path, .. } => {
                Some(log_path)
            }
            Self::StartFailed { log_path, .. } => log_path.as_ref(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::StartedTimedOut { .. } | Self::StartFailed { .. })
    }

    /// A timed-out start still gets a browser: the service may come up moments later.
    pub fn should_open_client(&self) -> bool {
        !matches!(self, Self::StartFailed { .. })
    }
}

impl fmt::Display for LaunchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning { url } => write!(f, "Already running at {url}"),
            Self::StartedAndReady { url, elapsed, .. } => {
                write!(f, "Started and ready at {url} after {:.1}s", elapsed.as_secs_f64())
            }
            Self::StartedTimedOut {
                url,
                waited,
                log_path,
                ..
            } => write!(
                f,
                "Started, but {url} was not reachable after {}s (log: {})",
                waited.as_secs(),
                log_path.display()
            ),
            Self::StartFailed {
                reason, log_path, ..
            } => match log_path {
                Some(path) => write!(f, "Failed to start: {reason} (log: {})", path.display()),
                None => write!(f, "Failed to start: {reason}"),
            },
        }
    }
}
