//! Best-effort removal of the user state listed in a manifest's `[zap]` table.
//!
//! Each pattern is expanded (`~`, `$VAR`, globs) and disposed of on its
//! own. Nothing here is fatal: a pattern that matches nothing is a skip, a
//! path that cannot be removed is a failure entry, and processing always
//! continues with the next pattern.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use cask_schema::zap::{split_root, validate_pattern};
use cask_schema::{ZapAction, ZapStanza};

use crate::io::extract::remove_path;

/// Why a zap entry did nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    NotFound,
    NotEmpty,
    NotADirectory,
    Unsafe(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::NotEmpty => f.write_str("directory not empty"),
            Self::NotADirectory => f.write_str("not a directory"),
            Self::Unsafe(why) => write!(f, "refused: {why}"),
        }
    }
}

/// What happened to one matched path (or one pattern that matched nothing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ZapOutcome {
    Removed,
    Trashed { to: PathBuf },
    WouldRemove,
    Skipped { reason: SkipReason },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ZapEntry {
    pub pattern: String,
    pub action: ZapAction,
    pub path: Option<PathBuf>,
    pub outcome: ZapOutcome,
}

/// Per-path results of a zap run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ZapReport {
    pub entries: Vec<ZapEntry>,
}

impl ZapReport {
    pub fn removed(&self) -> usize {
        self.count(|o| matches!(o, ZapOutcome::Removed | ZapOutcome::Trashed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ZapOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ZapOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&ZapOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

/// Expands `~` and `$VAR` prefixes against a fixed home and environment.
#[derive(Debug, Clone)]
pub struct Expander {
    home: PathBuf,
    vars: HashMap<String, String>,
}

impl Expander {
    /// Expander using the process environment.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self::with_vars(home, std::env::vars().collect())
    }

    /// Expander with an explicit variable table. `HOME` always maps to `home`.
    pub fn with_vars(home: impl Into<PathBuf>, vars: HashMap<String, String>) -> Self {
        Self {
            home: home.into(),
            vars,
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Split a pattern into its expanded root directory and the remainder.
    pub fn expand(&self, pattern: &str) -> Result<(PathBuf, String), String> {
        let (root, rest) = split_root(pattern)
            .ok_or_else(|| "must be absolute or start with ~/ or $VAR/".to_string())?;

        let root_dir = match root {
            "~" => self.home.clone(),
            "/" => PathBuf::from("/"),
            var => {
                let name = var
                    .trim_start_matches('$')
                    .trim_start_matches('{')
                    .trim_end_matches('}');
                if name == "HOME" {
                    self.home.clone()
                } else {
                    let value = self
                        .vars
                        .get(name)
                        .filter(|v| !v.is_empty())
                        .ok_or_else(|| format!("${name} is not set"))?;
                    PathBuf::from(value)
                }
            }
        };

        if !root_dir.is_absolute() {
            return Err(format!("{} is not absolute", root_dir.display()));
        }
        Ok((root_dir, rest.trim_start_matches('/').to_string()))
    }
}

/// Settings for one zap run.
#[derive(Debug, Clone)]
pub struct ZapOptions {
    pub trash_dir: PathBuf,
    pub dry_run: bool,
}

/// Process every entry of a zap stanza.
pub fn zap(stanza: &ZapStanza, expander: &Expander, opts: &ZapOptions) -> ZapReport {
    let mut report = ZapReport::default();

    for (action, pattern) in stanza.entries() {
        let entry = |path: Option<PathBuf>, outcome: ZapOutcome| ZapEntry {
            pattern: pattern.to_string(),
            action,
            path,
            outcome,
        };

        let matches = match resolve(pattern, expander) {
            Ok(m) => m,
            Err(why) => {
                tracing::warn!(pattern, "{why}");
                report.entries.push(entry(
                    None,
                    ZapOutcome::Skipped {
                        reason: SkipReason::Unsafe(why),
                    },
                ));
                continue;
            }
        };

        if matches.is_empty() {
            tracing::debug!(pattern, "nothing to zap");
            report.entries.push(entry(
                None,
                ZapOutcome::Skipped {
                    reason: SkipReason::NotFound,
                },
            ));
            continue;
        }

        for path in matches {
            let outcome = dispose(action, &path, opts);
            if let ZapOutcome::Failed { error } = &outcome {
                tracing::warn!(path = %path.display(), "zap failed: {error}");
            }
            report.entries.push(entry(Some(path), outcome));
        }
    }

    report
}

/// Expand a pattern to the existing paths it names.
fn resolve(pattern: &str, expander: &Expander) -> Result<Vec<PathBuf>, String> {
    validate_pattern(pattern).map_err(|e| e.to_string())?;
    let (root, rest) = expander.expand(pattern)?;
    let home = expander.home();

    let candidates: Vec<PathBuf> = if rest.contains(['*', '?', '[']) {
        let root_str = root
            .to_str()
            .ok_or_else(|| format!("{} is not valid UTF-8", root.display()))?;
        let full = format!(
            "{}/{rest}",
            glob::Pattern::escape(root_str.trim_end_matches('/'))
        );
        glob::glob(&full)
            .map_err(|e| e.to_string())?
            .filter_map(Result::ok)
            .collect()
    } else {
        let path = root.join(&rest);
        if path.symlink_metadata().is_ok() {
            vec![path]
        } else {
            Vec::new()
        }
    };

    let mut safe = Vec::with_capacity(candidates.len());
    for path in candidates {
        if path == root || path == home || path == Path::new("/") || !path.starts_with(&root) {
            return Err(format!("{} escapes {}", path.display(), root.display()));
        }
        safe.push(path);
    }
    Ok(safe)
}

fn dispose(action: ZapAction, path: &Path, opts: &ZapOptions) -> ZapOutcome {
    if action == ZapAction::Rmdir {
        match path.symlink_metadata() {
            Ok(meta) if !meta.is_dir() => {
                return ZapOutcome::Skipped {
                    reason: SkipReason::NotADirectory,
                };
            }
            Ok(_) => {}
            Err(e) => return failed(&e),
        }
        match std::fs::read_dir(path).map(|mut d| d.next().is_none()) {
            Ok(true) => {}
            Ok(false) => {
                return ZapOutcome::Skipped {
                    reason: SkipReason::NotEmpty,
                };
            }
            Err(e) => return failed(&e),
        }
    }

    if opts.dry_run {
        return ZapOutcome::WouldRemove;
    }

    match action {
        ZapAction::Delete => match remove_path(path) {
            Ok(()) => ZapOutcome::Removed,
            Err(e) => failed(&e),
        },
        ZapAction::Rmdir => match std::fs::remove_dir(path) {
            Ok(()) => ZapOutcome::Removed,
            Err(e) => failed(&e),
        },
        ZapAction::Trash => match move_to_trash(path, &opts.trash_dir) {
            Ok(to) => ZapOutcome::Trashed { to },
            Err(e) => failed(&e),
        },
    }
}

fn failed(e: &dyn std::fmt::Display) -> ZapOutcome {
    ZapOutcome::Failed {
        error: e.to_string(),
    }
}

/// Move `path` into the Trash under a name that does not collide.
fn move_to_trash(path: &Path, trash_dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(trash_dir)?;
    let name = path
        .file_name()
        .ok_or_else(|| std::io::Error::other("path has no file name"))?
        .to_string_lossy()
        .into_owned();

    let mut target = trash_dir.join(&name);
    if target.symlink_metadata().is_ok() {
        let stamp = chrono::Local::now().format("%H.%M.%S");
        target = trash_dir.join(format!("{name} {stamp}"));
        let mut n = 1;
        while target.symlink_metadata().is_ok() {
            target = trash_dir.join(format!("{name} {stamp} {n}"));
            n += 1;
        }
    }

    match std::fs::rename(path, &target) {
        Ok(()) => Ok(target),
        Err(_) if path.is_dir() => {
            let options = fs_extra::dir::CopyOptions::new().copy_inside(true);
            fs_extra::dir::move_dir(path, &target, &options).map_err(std::io::Error::other)?;
            Ok(target)
        }
        Err(_) => {
            fs_extra::file::move_file(path, &target, &fs_extra::file::CopyOptions::new())
                .map_err(std::io::Error::other)?;
            Ok(target)
        }
    }
}
