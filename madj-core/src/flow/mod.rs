// madj-core/src/flow/mod.rs
pub mod install;
pub mod launch;

pub use install::{InstallFlow, InstallOptions, InstallReport, Reconciliation};
pub use launch::{LaunchFlow, LaunchRequest};
