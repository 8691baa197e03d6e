// madj-core/src/lib.rs

pub mod flow;
pub mod fsutil;
pub mod opener;
pub mod probe;
pub mod process;
pub mod provision;
pub mod readiness;
pub mod service;
pub mod shortcut;
pub mod sync;

// Re-export key types for easier use by the CLI crate
pub use flow::{InstallFlow, InstallOptions, InstallReport, LaunchFlow, LaunchRequest};
pub use opener::{BrowserOpener, ClientOpener};
pub use probe::{PortProbe, TcpPortProbe};
pub use provision::{EnvironmentProvisioner, ProvisionAction, ProvisionOptions, VenvToolchain};
pub use readiness::{Readiness, ReadinessWaiter};
pub use service::{latest_log, LaunchSpec, ServiceLauncher, StreamlitLauncher};
pub use shortcut::{ShortcutDirs, ShortcutPublisher};
pub use sync::{SourceFetcher, SourceSynchronizer, SyncReport, SyncStatus};
