//! Command implementations.
//!
//! Each command loads only what it needs: [`Settings`] is cheap (config file
//! and layout), while [`Settings::context`] also opens the state database
//! and builds the HTTP client.

pub mod completions;
pub mod fetch;
pub mod hash;
pub mod history;
pub mod info;
pub mod install;
pub mod list;
pub mod outdated;
pub mod search;
pub mod uninstall;
pub mod url;
pub mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};

use cask_core::config::Config;
use cask_core::registry::CaskRegistry;
use cask_core::state::StateHandle;
use cask_core::{Context, Layout};
use cask_schema::CaskManifest;

use crate::Global;
use crate::ui::Output;

/// Layout and configuration resolved from the environment and flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub layout: Layout,
    pub config: Config,
    pub global: Global,
}

impl Settings {
    pub fn load(global: &Global) -> Result<Self> {
        let layout = Layout::from_env()
            .context("Could not determine home directory. Set CASK_HOME explicitly.")?;
        let mut config = Config::load(&layout.config_path())?;
        if let Some(dir) = &global.casks_dir {
            config.casks_dirs = vec![dir.clone()];
        }
        tracing::debug!(root = %layout.root().display(), ?config, "settings loaded");
        Ok(Self {
            layout,
            config,
            global: global.clone(),
        })
    }

    /// Open the state database and assemble a full operation context.
    pub fn context(&self) -> Result<Context> {
        let state = StateHandle::open_at(&self.layout.db_path())
            .context("Failed to open state database")?;
        let client = Context::build_client(&self.config).context("Failed to build HTTP client")?;
        let reporter = Arc::new(Output::new(self.global.quiet));
        Ok(Context::new(
            self.layout.clone(),
            self.config.clone(),
            state,
            client,
            reporter,
        )
        .with_dry_run(self.global.dry_run))
    }

    pub fn output(&self) -> Output {
        Output::new(self.global.quiet)
    }

    /// Load every manifest in the configured directories.
    pub fn registry(&self) -> Result<CaskRegistry> {
        let dirs: Vec<PathBuf> = self
            .config
            .casks_dirs
            .iter()
            .map(|d| self.resolve_dir(d))
            .collect();
        CaskRegistry::load_dirs(&dirs).context("Failed to load manifests")
    }

    /// Relative manifest directories are taken from the current directory.
    fn resolve_dir(&self, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| dir.to_path_buf(), |cwd| cwd.join(dir))
        }
    }

    /// Find a manifest by path (if `arg` names a file) or by token.
    pub fn manifest(&self, arg: &str) -> Result<CaskManifest> {
        let path = Path::new(arg);
        if path.is_file() {
            return CaskManifest::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()));
        }
        let registry = self.registry()?;
        match registry.find(arg) {
            Some(entry) => Ok(entry.manifest.clone()),
            None => bail!("No manifest found for '{arg}'"),
        }
    }
}
