//! User configuration (`~/.cask/config.toml`).
//!
//! Every key is optional. Environment variables take precedence over the
//! file: `CASK_APPDIR` for the applications directory and `CASK_CASKS_DIR`
//! (a `PATH`-style list) for manifest directories.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding [`Config::appdir`].
pub const APPDIR_ENV: &str = "CASK_APPDIR";
/// Environment variable overriding [`Config::casks_dirs`].
pub const CASKS_DIR_ENV: &str = "CASK_CASKS_DIR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where `.app` bundles are installed.
    pub appdir: PathBuf,
    /// Directories searched for manifests.
    pub casks_dirs: Vec<PathBuf>,
    /// Destination for `trash` zap entries. Defaults to `~/.Trash`.
    pub trash_dir: Option<PathBuf>,
    /// Remove the `com.apple.quarantine` attribute after install (macOS only).
    pub strip_quarantine: bool,
    /// HTTP connect timeout.
    pub connect_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            appdir: PathBuf::from("/Applications"),
            casks_dirs: vec![PathBuf::from("casks")],
            trash_dir: None,
            strip_quarantine: true,
            connect_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load the config file if present and apply environment overrides.
    ///
    /// A missing file yields defaults; a malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::default()
        };
        Ok(config.with_env(|k| std::env::var_os(k)))
    }

    /// Apply overrides from an environment lookup.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<std::ffi::OsString>) -> Self {
        if let Some(dir) = lookup(APPDIR_ENV).filter(|v| !v.is_empty()) {
            self.appdir = PathBuf::from(dir);
        }
        if let Some(dirs) = lookup(CASKS_DIR_ENV).filter(|v| !v.is_empty()) {
            self.casks_dirs = std::env::split_paths(&dirs).collect();
        }
        self
    }

    /// The Trash directory used by `trash` zap entries.
    pub fn trash_dir(&self, home: &Path) -> PathBuf {
        self.trash_dir
            .clone()
            .unwrap_or_else(|| home.join(".Trash"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::ffi::OsString;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml"))
            .unwrap()
            .with_env(|_| None);
        assert!(config.strip_quarantine);
        assert_eq!(config.connect_timeout_secs, 30);
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "appdir = \"/Users/me/Applications\"\nstrip_quarantine = false\n",
        )
        .unwrap();
        let config: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.appdir, PathBuf::from("/Users/me/Applications"));
        assert!(!config.strip_quarantine);
        assert_eq!(config.connect_timeout_secs, 30);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "appdir = [").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn env_overrides_file() {
        let env: HashMap<&str, OsString> = HashMap::from([
            (APPDIR_ENV, OsString::from("/tmp/apps")),
            (CASKS_DIR_ENV, OsString::from("/a:/b")),
        ]);
        let config = Config::default().with_env(|k| env.get(k).cloned());
        assert_eq!(config.appdir, PathBuf::from("/tmp/apps"));
        assert_eq!(config.casks_dirs, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    }

    #[test]
    fn trash_defaults_to_home() {
        let config = Config::default();
        assert_eq!(
            config.trash_dir(Path::new("/Users/me")),
            PathBuf::from("/Users/me/.Trash")
        );
    }
}
