use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{NotesError, Result};

/// Overrides the notes directory.
pub const ENV_NOTES_DIR: &str = "DESKNOTES_NOTES_DIR";
/// Overrides the server bind address.
pub const ENV_BIND: &str = "DESKNOTES_BIND";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory where note files are stored
    pub notes_dir: PathBuf,

    /// Extension of note files, without the dot
    pub note_extension: String,

    /// Address the HTTP server listens on
    pub bind_address: SocketAddr,

    /// Quiet period before an edited note is saved (milliseconds)
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let notes_dir = ProjectDirs::from("", "", "desknotes")
            .map(|dirs| dirs.data_dir().join("notes"))
            .unwrap_or_else(|| PathBuf::from("content").join("notes"));

        Self {
            notes_dir,
            note_extension: "mdx".to_string(),
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            debounce_ms: 500,
        }
    }
}

impl Config {
    /// Reads a JSON config file. Fields it leaves out keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let raw = fs::read_to_string(path).map_err(|e| NotesError::ConfigError {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| NotesError::ConfigError {
            message: format!("cannot parse {}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the optional file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies environment-style overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_NOTES_DIR).filter(|v| !v.is_empty()) {
            self.notes_dir = PathBuf::from(dir);
        }
        if let Some(bind) = lookup(ENV_BIND).filter(|v| !v.is_empty()) {
            self.bind_address = bind.parse().map_err(|e| NotesError::ConfigError {
                message: format!("{}={} is not a socket address: {}", ENV_BIND, bind, e),
            })?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        let ext = self.note_extension.as_str();
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            return Err(NotesError::ConfigError {
                message: format!("invalid note extension {:?}", ext),
            });
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.note_extension, "mdx");
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert!(config.notes_dir.ends_with("notes"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"notes_dir": "/tmp/elsewhere", "debounce_ms": 50}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.notes_dir, PathBuf::from("/tmp/elsewhere"));
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.note_extension, "mdx");
    }

    #[test]
    fn test_bad_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(NotesError::ConfigError { .. })
        ));
        assert!(matches!(
            Config::from_file(&temp_dir.path().join("missing.json")),
            Err(NotesError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(|key| match key {
                ENV_NOTES_DIR => Some("/srv/notes".to_string()),
                ENV_BIND => Some("0.0.0.0:8080".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.notes_dir, PathBuf::from("/srv/notes"));
        assert_eq!(config.bind_address.port(), 8080);

        assert!(config
            .apply_overrides(|key| (key == ENV_BIND).then(|| "nope".to_string()))
            .is_err());
    }

    #[test]
    fn test_rejects_bad_extension() {
        let config = Config {
            note_extension: ".mdx".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
