//! cask - declarative macOS application manifests
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! Validates, installs and fully removes `.app` bundles described by TOML
//! manifests.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.cask/
//! ├── Caskroom/   # Staging and manifest snapshots by token/version
//! ├── cache/      # Verified downloads
//! ├── config.toml # Optional user settings
//! └── state.db    # SQLite receipts and history
//! ```

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cask_schema::HashAlgorithm;

#[derive(Debug, Parser)]
#[command(name = "cask")]
#[command(author, version, about = "cask - declarative macOS application manifests")]
pub struct Cli {
    /// Show what would happen without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory containing manifests (overrides config and CASK_CASKS_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub casks_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate manifest files or directories of manifests
    Validate {
        /// Manifest files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show a cask's manifest and install state
    Info {
        /// Token or path to a manifest
        cask: String,
        /// Print the manifest as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved download URL
    Url {
        /// Token or path to a manifest
        cask: String,
    },
    /// Download and verify a cask's artifact into the cache
    Fetch {
        /// Tokens or paths to manifests
        #[arg(required = true)]
        casks: Vec<String>,
    },
    /// Install casks
    Install {
        /// Tokens or paths to manifests
        #[arg(required = true)]
        casks: Vec<String>,
        /// Reinstall even if the same version is present
        #[arg(short, long)]
        force: bool,
    },
    /// Remove an installed cask
    Uninstall {
        /// Token or path to a manifest
        cask: String,
        /// Also remove the user data listed in the manifest's zap table
        #[arg(long)]
        zap: bool,
    },
    /// Remove a cask and all user data listed in its zap table
    Zap {
        /// Token or path to a manifest
        cask: String,
    },
    /// List installed casks
    List,
    /// Search available manifests
    Search {
        /// Search query
        query: String,
    },
    /// List installed casks with newer versions available
    Outdated {
        /// Include casks that update themselves
        #[arg(long)]
        greedy: bool,
        /// Also poll each cask's appcast
        #[arg(long)]
        feeds: bool,
    },
    /// Show install history for a cask
    History {
        /// Cask token
        cask: String,
    },
    /// Compute the digest of a file (for manifest authoring)
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Digest algorithm
        #[arg(long, default_value_t = HashAlgorithm::Sha256)]
        algo: HashAlgorithm,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Global {
    pub dry_run: bool,
    pub quiet: bool,
    pub casks_dir: Option<PathBuf>,
}

impl From<&Cli> for Global {
    fn from(cli: &Cli) -> Self {
        Self {
            dry_run: cli.dry_run,
            quiet: cli.quiet,
            casks_dir: cli.casks_dir.clone(),
        }
    }
}
