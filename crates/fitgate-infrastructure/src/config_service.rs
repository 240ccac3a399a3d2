//! Configuration loading.

use std::path::{Path, PathBuf};

use fitgate_core::config::AppConfig;
use fitgate_core::error::{FitgateError, Result};

use crate::paths::FitgatePaths;
use crate::storage::AtomicTomlFile;

/// Reads and writes `config.toml`.
///
/// # Example
///
/// ```ignore
/// let service = ConfigService::new(FitgatePaths::from_env())?;
/// let config = service.load()?;
/// ```
#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: FitgatePaths,
    file: AtomicTomlFile<AppConfig>,
}

impl ConfigService {
    /// Uses the default `config.toml` location of `paths`.
    pub fn new(paths: FitgatePaths) -> Result<Self> {
        let config_file = paths.config_file()?;
        Ok(Self::with_file(paths, config_file))
    }

    /// Uses an explicit config file.
    pub fn with_file(paths: FitgatePaths, config_file: impl Into<PathBuf>) -> Self {
        Self {
            paths,
            file: AtomicTomlFile::new(config_file),
        }
    }

    pub fn config_file(&self) -> &Path {
        self.file.path()
    }

    /// Loads the configuration; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// [`FitgateError::Config`] when the file exists but cannot be parsed.
    pub fn load(&self) -> Result<AppConfig> {
        match self.file.load() {
            Ok(Some(config)) => {
                tracing::debug!("[Config] Loaded {:?}", self.config_file());
                Ok(config)
            }
            Ok(None) => {
                tracing::debug!(
                    "[Config] No config at {:?}, using defaults",
                    self.config_file()
                );
                Ok(AppConfig::default())
            }
            Err(e) => Err(FitgateError::config(format!(
                "Failed to load {:?}: {}",
                self.config_file(),
                e
            ))),
        }
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        self.file.save(config)
    }

    /// Session store location: the configured override or the default.
    pub fn session_file(&self, config: &AppConfig) -> Result<PathBuf> {
        match &config.storage.session_file {
            Some(path) => Ok(path.clone()),
            None => self.paths.session_file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitgate_core::routing::UnmatchedRoutePolicy;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> ConfigService {
        ConfigService::new(FitgatePaths::new(Some(dir.path().to_path_buf()))).unwrap()
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = service(&temp_dir).load().unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let mut config = AppConfig::default();
        config.routing.unmatched_authenticated = UnmatchedRoutePolicy::RedirectToActivities;
        config.logging.level = "debug".to_string();
        service.save(&config).unwrap();

        assert_eq!(service.load().unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);
        std::fs::write(service.config_file(), "[routing\n").unwrap();

        let err = service.load().unwrap_err();
        assert!(matches!(err, FitgateError::Config(_)));
    }

    #[test]
    fn test_session_file_override() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);

        let mut config = AppConfig::default();
        assert_eq!(
            service.session_file(&config).unwrap(),
            temp_dir.path().join("session.toml")
        );

        config.storage.session_file = Some(PathBuf::from("/var/lib/fitgate/s.toml"));
        assert_eq!(
            service.session_file(&config).unwrap(),
            PathBuf::from("/var/lib/fitgate/s.toml")
        );
    }
}
