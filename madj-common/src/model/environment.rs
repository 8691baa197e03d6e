// madj-common/src/model/environment.rs
use std::path::{Path, PathBuf};

/// An isolated Python environment (a venv) under the install root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnvironment {
    pub path: PathBuf,
    pub interpreter: PathBuf,
}

impl RuntimeEnvironment {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let interpreter = interpreter_in(&path);
        Self { path, interpreter }
    }

    /// Reusable iff the interpreter executable exists where a venv puts it.
    pub fn is_reusable(&self) -> bool {
        self.interpreter.is_file()
    }
}

#[cfg(windows)]
pub fn interpreter_in(env_path: &Path) -> PathBuf {
    env_path.join("Scripts").join("python.exe")
}

#[cfg(not(windows))]
pub fn interpreter_in(env_path: &Path) -> PathBuf {
    env_path.join("bin").join("python")
}
