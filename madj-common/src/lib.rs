// madj-common/src/lib.rs
pub mod config;
pub mod error;
pub mod model;

// Re-export key types
pub use config::Config;
pub use error::{MadjError, Result};
pub use model::{
    DependencyManifest, InstallationState, LaunchOutcome, Mode, RuntimeEnvironment,
    ServiceHandle, ShortcutEntry, SourceResource,
};
