// madj-common/src/model/manifest.rs
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// What the served app imports. Used when no requirements.txt was synced.
pub const DEFAULT_REQUIREMENTS: &[&str] = &[
    "streamlit",
    "pandas",
    "numpy",
    "matplotlib",
    "plotly",
    "reportlab",
];

/// Flat list of pip requirement specifiers, passed to the installer verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DependencyManifest {
    pub requirements: Vec<String>,
}

impl DependencyManifest {
    pub fn new<I, S>(requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            requirements: requirements.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parse(contents: &str) -> Self {
        Self::new(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    /// Reads `path` when it exists, else falls back to `defaults`.
    pub fn load_or(path: &Path, defaults: &[String]) -> Result<Self> {
        if path.is_file() {
            debug!("Reading dependency manifest from {}", path.display());
            let manifest = Self::parse(&fs::read_to_string(path)?);
            if !manifest.is_empty() {
                return Ok(manifest);
            }
            debug!("{} lists no requirements, using defaults", path.display());
        }
        Ok(Self::new(defaults.iter().cloned()))
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn to_requirements_txt(&self) -> String {
        let mut out = self.requirements.join("\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let manifest = DependencyManifest::parse(
            "# pinned for the adjustment tool\nstreamlit==1.38.0\n\n  pandas>=2.0  \n",
        );
        assert_eq!(manifest.requirements, vec!["streamlit==1.38.0", "pandas>=2.0"]);
    }

    #[test]
    fn load_or_uses_defaults_when_missing_or_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requirements.txt");
        let defaults = vec!["streamlit".to_string()];

        assert_eq!(
            DependencyManifest::load_or(&path, &defaults).unwrap().requirements,
            defaults
        );

        fs::write(&path, "# nothing yet\n").unwrap();
        assert_eq!(
            DependencyManifest::load_or(&path, &defaults).unwrap().requirements,
            defaults
        );

        fs::write(&path, "plotly\n").unwrap();
        assert_eq!(
            DependencyManifest::load_or(&path, &defaults).unwrap().requirements,
            vec!["plotly"]
        );
    }
}
