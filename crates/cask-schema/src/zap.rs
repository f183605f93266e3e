//! Zap stanzas: user state removed on full uninstall.

use serde::{Deserialize, Serialize};

use crate::ManifestError;

/// How a zap entry is disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZapAction {
    /// Move the matched paths to the user's Trash.
    Trash,
    /// Delete the matched paths outright.
    Delete,
    /// Remove the matched directories only if they are empty.
    Rmdir,
}

impl std::fmt::Display for ZapAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Trash => "trash",
            Self::Delete => "delete",
            Self::Rmdir => "rmdir",
        })
    }
}

/// The `[zap]` table of a manifest.
///
/// Entries are advisory path patterns: they may contain globs and `~/` or
/// `$VAR/` prefixes, and are not expected to exist at uninstall time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZapStanza {
    /// Patterns moved to the Trash.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trash: Vec<String>,
    /// Patterns deleted outright.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<String>,
    /// Directories removed when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rmdir: Vec<String>,
}

impl ZapStanza {
    /// Every entry tagged with its action, in declaration order
    /// (`trash`, then `delete`, then `rmdir`).
    pub fn entries(&self) -> impl Iterator<Item = (ZapAction, &str)> {
        tagged(ZapAction::Trash, &self.trash)
            .chain(tagged(ZapAction::Delete, &self.delete))
            .chain(tagged(ZapAction::Rmdir, &self.rmdir))
    }

    /// All patterns as one ordered list.
    pub fn paths(&self) -> Vec<&str> {
        self.entries().map(|(_, p)| p).collect()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.trash.len() + self.delete.len() + self.rmdir.len()
    }

    /// True when no zap entries are declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate every entry, reporting each bad or repeated pattern.
    pub fn problems(&self) -> Vec<ManifestError> {
        let mut seen = std::collections::HashSet::new();
        let mut problems = Vec::new();
        for pattern in self.paths() {
            if let Err(e) = validate_pattern(pattern) {
                problems.push(e);
            } else if !seen.insert(pattern) {
                problems.push(ManifestError::InvalidZapPath {
                    pattern: pattern.to_string(),
                    reason: "duplicate entry".to_string(),
                });
            }
        }
        problems
    }
}

fn tagged(action: ZapAction, list: &[String]) -> impl Iterator<Item = (ZapAction, &str)> {
    list.iter().map(move |p| (action, p.as_str()))
}

const GLOB_CHARS: [char; 4] = ['*', '?', '[', '{'];

/// Split a pattern into its root prefix (`/`, `~/` or `$VAR/`) and the rest.
///
/// Returns `None` for relative patterns.
pub fn split_root(pattern: &str) -> Option<(&str, &str)> {
    if let Some(rest) = pattern.strip_prefix("~/") {
        return Some(("~", rest));
    }
    if pattern == "~" {
        return Some(("~", ""));
    }
    if let Some(var) = pattern.strip_prefix('$') {
        let (name, rest) = var.split_once('/').unwrap_or((var, ""));
        let name = name.trim_start_matches('{').trim_end_matches('}');
        if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            let root_len = pattern.len() - rest.len();
            let root = pattern[..root_len].trim_end_matches('/');
            return Some((root, rest));
        }
        return None;
    }
    pattern.strip_prefix('/').map(|rest| ("/", rest))
}

/// Check that a zap entry is a syntactically valid, bounded path pattern.
///
/// # Errors
///
/// Returns [`ManifestError::InvalidZapPath`] when the pattern is empty,
/// relative, contains a NUL byte or a `..` component, names a root (`/`,
/// `~`, `$HOME`) itself, globs its first component, or is not a valid glob.
pub fn validate_pattern(pattern: &str) -> Result<(), ManifestError> {
    let reject = |reason: &str| ManifestError::InvalidZapPath {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    if pattern.trim().is_empty() {
        return Err(reject("empty pattern"));
    }
    if pattern.contains('\0') {
        return Err(reject("contains a NUL byte"));
    }
    let (_, rest) = split_root(pattern)
        .ok_or_else(|| reject("must be absolute or start with ~/ or $VAR/"))?;

    let components: Vec<&str> = rest.split('/').filter(|c| !c.is_empty()).collect();
    if components.is_empty() {
        return Err(reject("refers to a root directory"));
    }
    if components.iter().any(|c| *c == "..") {
        return Err(reject("contains a '..' component"));
    }
    if components[0].contains(GLOB_CHARS) {
        return Err(reject("first component must be literal"));
    }
    glob::Pattern::new(pattern).map_err(|e| reject(&e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_declaration_order() {
        let z = ZapStanza {
            trash: vec!["~/Library/A".into(), "~/Library/B".into()],
            delete: vec!["/tmp/c".into()],
            rmdir: vec!["~/Library/D".into()],
        };
        let got: Vec<_> = z.entries().collect();
        assert_eq!(got[0], (ZapAction::Trash, "~/Library/A"));
        assert_eq!(got[2], (ZapAction::Delete, "/tmp/c"));
        assert_eq!(got[3], (ZapAction::Rmdir, "~/Library/D"));
        assert_eq!(z.paths().len(), 4);
    }

    #[test]
    fn accepts_home_absolute_env_and_globs() {
        for p in [
            "~/Library/Caches/com.skype.skype",
            "~/Library/Group Containers/*.com.skype.skype",
            "~/Library/Preferences/ByHost/com.skype.skype.*.plist",
            "/Library/Application Support/Skype",
            "$HOME/Library/Skype",
            "${TMPDIR}/skype",
        ] {
            assert!(validate_pattern(p).is_ok(), "{p} should be valid");
        }
    }

    #[test]
    fn rejects_dangerous_or_malformed_patterns() {
        for p in [
            "",
            "Library/Skype",
            "~",
            "~/",
            "/",
            "$HOME",
            "~/*",
            "~/Library/../..",
            "~/Library/[unclosed",
        ] {
            assert!(validate_pattern(p).is_err(), "{p:?} should be rejected");
        }
    }

    #[test]
    fn duplicates_are_reported() {
        let z = ZapStanza {
            trash: vec!["~/Library/A".into()],
            delete: vec!["~/Library/A".into()],
            rmdir: vec![],
        };
        let problems = z.problems();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].to_string().contains("duplicate"));
    }

    #[test]
    fn split_root_variants() {
        assert_eq!(split_root("~/a/b"), Some(("~", "a/b")));
        assert_eq!(split_root("/a/b"), Some(("/", "a/b")));
        assert_eq!(split_root("$HOME/a"), Some(("$HOME", "a")));
        assert_eq!(split_root("${HOME}/a"), Some(("${HOME}", "a")));
        assert_eq!(split_root("a/b"), None);
    }
}
