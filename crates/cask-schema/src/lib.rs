//! Shared manifest types for cask.
//!
//! A cask manifest is a flat, immutable TOML record describing how to fetch,
//! verify, install and fully remove one macOS application. This crate owns
//! the data model and its schema validation; all side effects live in
//! `cask-core`.

pub mod error;
pub mod hash;
pub mod manifest;
pub mod types;
pub mod url;
pub mod zap;

// Re-exports
pub use error::{ManifestError, ValidationReport};
pub use hash::{Checksum, HashAlgorithm};
pub use manifest::{CaskInfo, CaskManifest, InstallSpec, Source};
pub use types::{Token, Version};
pub use url::UrlTemplate;
pub use zap::{ZapAction, ZapStanza};

/// File extension used by manifest files on disk.
pub const MANIFEST_EXTENSION: &str = "toml";
