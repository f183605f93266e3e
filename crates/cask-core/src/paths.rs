use std::path::{Path, PathBuf};

use dirs::home_dir;

use cask_schema::{Token, Version};

/// Environment variable overriding the cask home directory.
pub const HOME_ENV: &str = "CASK_HOME";

/// Returns the primary state directory, or None if the user's home cannot be resolved.
pub fn try_cask_home() -> Option<PathBuf> {
    if let Some(val) = std::env::var_os(HOME_ENV) {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".cask"))
}

/// On-disk layout rooted at the cask home (`~/.cask` by default).
///
/// ```text
/// ~/.cask/
/// ├── Caskroom/<token>/<version>/   # staging + installed manifest snapshot
/// ├── cache/                        # verified downloads
/// ├── config.toml
/// └── state.db                      # install receipts and history
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Layout rooted at an explicit directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout rooted at `$CASK_HOME` or `~/.cask`.
    pub fn from_env() -> Option<Self> {
        try_cask_home().map(Self::at)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `SQLite` database path: ~/.cask/state.db
    pub fn db_path(&self) -> PathBuf {
        self.root.join("state.db")
    }

    /// Download cache: ~/.cask/cache
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// User configuration: ~/.cask/config.toml
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Per-token staging root: ~/.cask/Caskroom/<token>
    pub fn caskroom(&self, token: &Token) -> PathBuf {
        self.root.join("Caskroom").join(token)
    }

    /// Per-version staging directory: ~/.cask/Caskroom/<token>/<version>
    pub fn caskroom_version(&self, token: &Token, version: &Version) -> PathBuf {
        self.caskroom(token).join(version)
    }

    /// Snapshot of the manifest an installed version came from.
    pub fn metadata_path(&self, token: &Token, version: &Version) -> PathBuf {
        self.caskroom_version(token, version).join(".metadata.json")
    }

    /// Cache file for a download: `<token>--<version>--<filename>`
    pub fn cached_download(&self, token: &Token, version: &Version, url: &str) -> PathBuf {
        let name = filename_from_url(url);
        let name = if name.is_empty() { "download" } else { name };
        self.cache_dir().join(format!("{token}--{version}--{name}"))
    }
}

/// Extract the filename from a URL, ignoring any query or fragment.
pub fn filename_from_url(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.split('/').next_back().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let layout = Layout::at("/tmp/cask-home");
        let token = Token::new("skype");
        let version = Version::from("8.34.0.78");
        assert_eq!(layout.db_path(), PathBuf::from("/tmp/cask-home/state.db"));
        assert_eq!(
            layout.caskroom_version(&token, &version),
            PathBuf::from("/tmp/cask-home/Caskroom/skype/8.34.0.78")
        );
        assert_eq!(
            layout.cached_download(&token, &version, "https://h/p/Skype-8.34.0.78.dmg?x=1"),
            PathBuf::from("/tmp/cask-home/cache/skype--8.34.0.78--Skype-8.34.0.78.dmg")
        );
    }

    #[test]
    fn filename_handles_query_and_trailing_slash() {
        assert_eq!(filename_from_url("https://h/a/b.zip"), "b.zip");
        assert_eq!(filename_from_url("https://h/a/b.zip?sig=1#frag"), "b.zip");
        assert_eq!(filename_from_url("https://h/a/"), "");
        assert_eq!(filename_from_url(""), "");
    }
}
