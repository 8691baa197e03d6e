// madj-common/src/model/mod.rs
pub mod environment;
pub mod installation;
pub mod manifest;
pub mod outcome;
pub mod service;
pub mod shortcut;
pub mod source;

pub use environment::RuntimeEnvironment;
pub use installation::{InstallationState, Mode};
pub use manifest::DependencyManifest;
pub use outcome::LaunchOutcome;
pub use service::{ServiceHandle, ServiceProcess};
pub use shortcut::ShortcutEntry;
pub use source::SourceResource;
