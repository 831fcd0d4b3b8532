//! File system paths for the session engine shell.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Config filename under the base runtime directory.
const CONFIG_FILE_NAME: &str = "config.json";

/// Manages file system paths for the engine shell.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.shiftwise)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.shiftwise`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".shiftwise"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.shiftwise).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.shiftwise/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE_NAME)
    }

    /// Ensure the base directory exists.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_with_base_dir() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        assert_eq!(paths.base_dir(), &dir.path().to_path_buf());
        assert_eq!(paths.config_file(), dir.path().join("config.json"));
    }

    #[test]
    fn test_ensure_dirs_creates_base() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("nested").join("runtime");
        let paths = Paths::with_base_dir(base.clone());
        paths.ensure_dirs().unwrap();
        assert!(base.is_dir());
    }
}
