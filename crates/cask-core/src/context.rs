//! Shared operation context.
//!
//! Groups the state every install, uninstall and feed check needs so the
//! operations do not take half a dozen arguments each.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::Reporter;
use crate::config::Config;
use crate::paths::Layout;
use crate::state::StateHandle;

#[derive(Clone)]
pub struct Context {
    pub layout: Layout,
    pub config: Config,
    pub state: StateHandle,
    pub client: reqwest::Client,
    pub reporter: Arc<dyn Reporter>,
    /// The user's home directory, used for `~` in zap patterns.
    pub home: PathBuf,
    /// Report what would happen without touching the filesystem.
    pub dry_run: bool,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("layout", &self.layout)
            .field("config", &self.config)
            .field("home", &self.home)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(
        layout: Layout,
        config: Config,
        state: StateHandle,
        client: reqwest::Client,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        // Without a resolvable $HOME, fall back to the directory holding the cask home.
        let home = dirs::home_dir().unwrap_or_else(|| {
            layout
                .root()
                .parent()
                .unwrap_or(layout.root())
                .to_path_buf()
        });
        Self {
            layout,
            config,
            state,
            client,
            reporter,
            home,
            dry_run: false,
        }
    }

    /// HTTP client configured from the user's settings.
    pub fn build_client(config: &Config) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
