//! Archive detection, ZIP extraction and `.app` bundle placement.

use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use walkdir::WalkDir;

/// Magic bytes at the start of a ZIP local file header.
pub const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
/// Signature of the UDIF trailer found in the last 512 bytes of a DMG.
pub const DMG_TRAILER_MAGIC: [u8; 4] = *b"koly";

/// Container format of a downloaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Dmg,
    Zip,
}

impl ArtifactFormat {
    /// Guess the format from a URL or file name extension.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = crate::paths::filename_from_url(name).to_ascii_lowercase();
        if lower.ends_with(".dmg") {
            Some(Self::Dmg)
        } else if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }

    /// Identify the format from file contents.
    pub fn sniff(path: &Path) -> std::io::Result<Option<Self>> {
        let mut file = std::fs::File::open(path)?;
        let len = file.metadata()?.len();

        let mut head = [0u8; 4];
        if len >= 4 {
            file.read_exact(&mut head)?;
            if head == ZIP_MAGIC {
                return Ok(Some(Self::Zip));
            }
        }
        if len >= 512 {
            file.seek(SeekFrom::End(-512))?;
            let mut trailer = [0u8; 4];
            file.read_exact(&mut trailer)?;
            if trailer == DMG_TRAILER_MAGIC {
                return Ok(Some(Self::Dmg));
            }
        }
        Ok(None)
    }

    /// Detect by name first, then by contents.
    pub fn detect(url: &str, path: &Path) -> std::io::Result<Option<Self>> {
        match Self::from_name(url) {
            Some(f) => Ok(Some(f)),
            None => Self::sniff(path),
        }
    }
}

/// Extract a ZIP archive into `dest`.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = std::fs::File::open(archive)
        .with_context(|| format!("Failed to open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file).context("Not a valid zip archive")?;
    std::fs::create_dir_all(dest)?;
    zip.extract(dest).context("Failed to extract zip archive")?;
    Ok(())
}

/// Locate the bundle to install under `root`.
///
/// The exact `app_name` wins; otherwise the first `*.app` within three
/// levels is used. Hidden entries and bundles nested inside other bundles
/// are ignored.
pub fn find_app(root: &Path, app_name: &str) -> Result<PathBuf> {
    let exact = root.join(app_name);
    if exact.is_dir() {
        return Ok(exact);
    }

    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(3)
        .sort_by_file_name()
        .into_iter();
    let mut fallback = None;

    while let Some(entry) = walker.next() {
        let Ok(entry) = entry else { continue };
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }
        if entry.file_type().is_dir() && entry.path().extension().is_some_and(|e| e == "app") {
            if name == app_name {
                return Ok(entry.into_path());
            }
            if fallback.is_none() {
                fallback = Some(entry.path().to_path_buf());
            }
            walker.skip_current_dir();
        }
    }

    match fallback {
        Some(path) => {
            tracing::debug!(found = %path.display(), wanted = app_name, "using first bundle found");
            Ok(path)
        }
        None => bail!("No .app found in {}", root.display()),
    }
}

/// Place `src` at `dest`, replacing anything already there.
///
/// The new bundle is first staged in a hidden directory next to `dest`
/// (a rename when allowed, otherwise a copy). Any existing bundle is only
/// moved aside once staging succeeded, and is restored if the final rename
/// fails.
pub fn place_bundle(src: &Path, dest: &Path, allow_move: bool) -> Result<()> {
    let parent = dest
        .parent()
        .with_context(|| format!("{} has no parent directory", dest.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    // Removed on drop, taking the replaced bundle with it.
    let staging = tempfile::Builder::new()
        .prefix(".cask-")
        .tempdir_in(parent)
        .with_context(|| format!("Failed to create staging dir in {}", parent.display()))?;
    let staged = staging.path().join("new");
    if !(allow_move && std::fs::rename(src, &staged).is_ok()) {
        copy_bundle(src, &staged)?;
    }

    let previous = staging.path().join("old");
    let replacing = dest.symlink_metadata().is_ok();
    if replacing {
        std::fs::rename(dest, &previous)
            .with_context(|| format!("Failed to move aside {}", dest.display()))?;
    }
    if let Err(e) = std::fs::rename(&staged, dest) {
        if replacing {
            std::fs::rename(&previous, dest).ok();
        }
        return Err(e).with_context(|| format!("Failed to place {}", dest.display()));
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn copy_bundle(src: &Path, dest: &Path) -> Result<()> {
    // ditto keeps symlinks, extended attributes and code signatures intact.
    let status = std::process::Command::new("ditto")
        .arg(src)
        .arg(dest)
        .status()
        .context("Failed to execute ditto")?;
    if !status.success() {
        bail!("ditto failed copying {}", src.display());
    }
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn copy_bundle(src: &Path, dest: &Path) -> Result<()> {
    let options = fs_extra::dir::CopyOptions::new().copy_inside(true);
    fs_extra::dir::copy(src, dest, &options)
        .with_context(|| format!("Failed to copy {}", src.display()))?;
    Ok(())
}

/// Remove a file, symlink or directory tree.
pub fn remove_path(path: &Path) -> std::io::Result<()> {
    let meta = path.symlink_metadata()?;
    if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

/// Total size of regular files under `path`.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .flatten()
        .filter_map(|e| e.metadata().ok())
        .filter(std::fs::Metadata::is_file)
        .map(|m| m.len())
        .sum()
}
