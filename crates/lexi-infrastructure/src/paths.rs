//! Path management for Lexi's client-side files.

use std::path::{Path, PathBuf};

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolves where Lexi keeps its files.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/lexi/          # Config directory (platform default via `dirs`)
/// ├── config.toml          # Client configuration
/// └── identity.json        # Local identity token
/// ```
///
/// Tests and embedders can pass a base directory to keep everything inside it.
#[derive(Debug, Clone, Default)]
pub struct LexiPaths {
    base: Option<PathBuf>,
}

impl LexiPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the Lexi configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: the base directory if one was given, otherwise
    ///   `<platform config dir>/lexi`
    /// - `Err(PathError::ConfigDirNotFound)`: no platform config dir
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join("lexi"))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn identity_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("identity.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_directory_overrides_platform_dir() {
        let paths = LexiPaths::new(Some(Path::new("/tmp/lexi-test")));
        assert_eq!(
            paths.identity_file().unwrap(),
            PathBuf::from("/tmp/lexi-test/identity.json")
        );
        assert_eq!(
            paths.config_file().unwrap(),
            PathBuf::from("/tmp/lexi-test/config.toml")
        );
    }
}
