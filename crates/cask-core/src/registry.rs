//! A collection of manifests loaded from disk.
//!
//! Tokens must be unique across every directory in the collection; a
//! repeated token is reported with both file paths.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use walkdir::WalkDir;

use cask_schema::{CaskManifest, MANIFEST_EXTENSION, ManifestError, Token};

/// A manifest together with the file it came from.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub path: PathBuf,
    pub manifest: CaskManifest,
}

/// Manifests keyed by token.
#[derive(Debug, Clone, Default)]
pub struct CaskRegistry {
    entries: BTreeMap<Token, RegistryEntry>,
}

impl CaskRegistry {
    /// Load every `*.toml` directly inside each of `dirs`.
    ///
    /// Directories that do not exist are skipped. Any manifest that fails to
    /// parse, or any duplicate token, is an error.
    pub fn load_dirs<P: AsRef<Path>>(dirs: &[P]) -> Result<Self, ManifestError> {
        let mut registry = Self::default();
        for dir in dirs {
            let dir = dir.as_ref();
            if !dir.is_dir() {
                tracing::debug!(dir = %dir.display(), "manifest directory missing, skipping");
                continue;
            }
            let files = WalkDir::new(dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().extension().is_some_and(|x| x == MANIFEST_EXTENSION));

            for entry in files {
                registry.insert_file(entry.path())?;
            }
        }
        tracing::debug!(count = registry.len(), "loaded manifests");
        Ok(registry)
    }

    /// Parse one manifest file and add it.
    pub fn insert_file(&mut self, path: &Path) -> Result<&RegistryEntry, ManifestError> {
        let manifest = CaskManifest::from_file(path)?;
        self.insert(path.to_path_buf(), manifest)
    }

    /// Add a manifest, rejecting a token that is already present.
    pub fn insert(
        &mut self,
        path: PathBuf,
        manifest: CaskManifest,
    ) -> Result<&RegistryEntry, ManifestError> {
        let token = manifest.token().clone();
        if let Some(existing) = self.entries.get(&token) {
            return Err(ManifestError::DuplicateToken {
                token: token.to_string(),
                first: existing.path.clone(),
                second: path,
            });
        }
        Ok(self
            .entries
            .entry(token)
            .or_insert(RegistryEntry { path, manifest }))
    }

    pub fn find(&self, token: &str) -> Option<&RegistryEntry> {
        self.entries.get(token.to_ascii_lowercase().as_str())
    }

    /// Manifests whose token, name or description match `query`, best first.
    pub fn search(&self, query: &str) -> Vec<&RegistryEntry> {
        let matcher = SkimMatcherV2::default().ignore_case();
        let mut scored: Vec<(i64, &RegistryEntry)> = self
            .entries
            .values()
            .filter_map(|entry| {
                let info = &entry.manifest.cask;
                [
                    Some(info.token.as_str()),
                    Some(info.name.as_str()),
                    info.desc.as_deref(),
                ]
                .into_iter()
                .flatten()
                .filter_map(|field| matcher.fuzzy_match(field, query))
                .max()
                .map(|score| (score, entry))
            })
            .collect();
        scored.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| a.1.manifest.token().cmp(b.1.manifest.token()))
        });
        scored.into_iter().map(|(_, e)| e).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
