// madj-core/src/fsutil.rs
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use madj_common::error::{MadjError, Result};
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};

/// Writes `bytes` to `path` through a temp file in the same directory, so readers never see a
/// half-written file. Overwrites whatever was there.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        MadjError::Generic(format!("{} has no parent directory", path.display()))
    })?;
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| {
        error!("Failed to move temp file into {}: {}", path.display(), e.error);
        MadjError::from(e.error)
    })?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Removes a file, symlink or directory tree.
///
/// Returns `true` if the artifact is removed or was already gone, `false` otherwise.
pub fn remove_filesystem_artifact(path: &Path) -> bool {
    match path.symlink_metadata() {
        Ok(metadata) => {
            let is_real_dir = metadata.file_type().is_dir();
            let result = if is_real_dir {
                fs::remove_dir_all(path)
            } else {
                // This handles both files and symlinks
                fs::remove_file(path)
            };
            match result {
                Ok(()) => {
                    debug!("Removed artifact: {}", path.display());
                    true
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => true,
                Err(e) => {
                    warn!("Failed to remove artifact {}: {}", path.display(), e);
                    false
                }
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!(
                "Failed to get metadata for artifact {}: {}",
                path.display(),
                e
            );
            false
        }
    }
}

#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app/nested/file.txt");
        atomic_write(&path, b"one").unwrap();
        atomic_write(&path, b"two").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");
        // No temp files left behind.
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn removing_missing_artifact_counts_as_removed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_filesystem_artifact(&dir.path().join("nope")));

        let sub = dir.path().join("sub");
        fs::create_dir_all(sub.join("inner")).unwrap();
        assert!(remove_filesystem_artifact(&sub));
        assert!(!sub.exists());
    }
}
