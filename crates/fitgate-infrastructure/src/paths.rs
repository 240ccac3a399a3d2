//! Unified path management for Fitgate files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/fitgate/           # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/fitgate/      # Data directory
//! └── session.toml             # Persistent session store
//! ```
//!
//! Setting `FITGATE_HOME` (or passing a base directory) puts both files
//! directly under that directory instead.

use std::path::PathBuf;

use fitgate_core::error::{FitgateError, Result};

/// Environment variable overriding the platform directories.
pub const HOME_ENV: &str = "FITGATE_HOME";

const APP_DIR: &str = "fitgate";

#[derive(Debug, Clone, Default)]
pub struct FitgatePaths {
    base: Option<PathBuf>,
}

impl FitgatePaths {
    /// Uses `base` for everything when given, platform directories otherwise.
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    /// Honors `FITGATE_HOME` when set and non-empty.
    pub fn from_env() -> Self {
        let base = std::env::var_os(HOME_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::new(base)
    }

    pub fn config_dir(&self) -> Result<PathBuf> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| FitgateError::config("Cannot determine config directory"))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| FitgateError::config("Cannot determine data directory"))
    }

    /// Path to `config.toml`.
    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Default location of the persistent session store.
    pub fn session_file(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("session.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_override() {
        let paths = FitgatePaths::new(Some(PathBuf::from("/tmp/fitgate-test")));
        assert_eq!(
            paths.config_file().unwrap(),
            PathBuf::from("/tmp/fitgate-test/config.toml")
        );
        assert_eq!(
            paths.session_file().unwrap(),
            PathBuf::from("/tmp/fitgate-test/session.toml")
        );
    }
}
