use std::fs;
use std::path::Path;

use depot_error::{DepotError, Result};

/// Filesystem operations the fetcher needs to lay out a package.
pub trait InstallTarget: Send + Sync + 'static {
    /// Creates the package's own directory. Fails if it already exists;
    /// missing parents (the install root, a scope folder) are created.
    fn create_package_dir(&self, path: &Path) -> Result<()>;

    /// Removes a previously installed package directory, if present.
    fn remove_package_dir(&self, path: &Path) -> Result<()>;

    /// Creates `path` and its parents; existing directories are fine.
    fn ensure_dir(&self, path: &Path) -> Result<()>;

    /// Creates or truncates `path` and writes `contents`.
    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl InstallTarget for LocalFs {
    fn create_package_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DepotError::io(parent, e))?;
        }
        fs::create_dir(path).map_err(|e| DepotError::io(path, e))
    }

    fn remove_package_dir(&self, path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_dir_all(path).map_err(|e| DepotError::io(path, e))?;
        }
        Ok(())
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| DepotError::io(path, e))
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents).map_err(|e| DepotError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_package_dir_makes_parents() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("node_modules").join("@types").join("node");

        LocalFs.create_package_dir(&dir).unwrap();

        assert!(dir.is_dir());
    }

    #[test]
    fn test_create_package_dir_rejects_existing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("foo");
        LocalFs.create_package_dir(&dir).unwrap();

        let err = LocalFs.create_package_dir(&dir).unwrap_err();

        assert!(err.is_io());
    }

    #[test]
    fn test_remove_then_recreate() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("foo");
        LocalFs.create_package_dir(&dir).unwrap();
        LocalFs.write_file(&dir.join("stale.js"), b"old").unwrap();

        LocalFs.remove_package_dir(&dir).unwrap();
        LocalFs.create_package_dir(&dir).unwrap();

        assert!(!dir.join("stale.js").exists());
    }

    #[test]
    fn test_write_file_truncates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("index.js");
        LocalFs.write_file(&file, b"a much longer first version").unwrap();

        LocalFs.write_file(&file, b"short").unwrap();

        assert_eq!(fs::read(&file).unwrap(), b"short");
    }
}
