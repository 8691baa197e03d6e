// madj-common/src/model/source.rs
use std::path::PathBuf;

/// One application file kept current by the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResource {
    /// Absolute URL, or a name resolved against the configured base URL.
    pub remote: String,
    /// Relative to the install root.
    pub destination: PathBuf,
    pub sha256: Option<String>,
}

impl SourceResource {
    pub fn new(remote: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            remote: remote.into(),
            destination: destination.into(),
            sha256: None,
        }
    }

    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }

    pub fn is_absolute_url(&self) -> bool {
        self.remote.starts_with("http://") || self.remote.starts_with("https://")
    }

    /// Full URL for this resource, if one can be formed.
    pub fn resolve_url(&self, base_url: Option<&str>) -> Option<String> {
        if self.is_absolute_url() {
            return Some(self.remote.clone());
        }
        base_url.map(|base| {
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                self.remote.trim_start_matches('/')
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_names_against_base() {
        let res = SourceResource::new("market_condition_app.py", "app/market_condition_app.py");
        assert_eq!(res.resolve_url(None), None);
        assert_eq!(
            res.resolve_url(Some("https://example.invalid/releases/")).as_deref(),
            Some("https://example.invalid/releases/market_condition_app.py")
        );

        let absolute = SourceResource::new("https://cdn.invalid/icon.png", "app/icon.png");
        assert_eq!(
            absolute.resolve_url(Some("https://example.invalid")).as_deref(),
            Some("https://cdn.invalid/icon.png")
        );
    }
}
