//! DMG handling via hdiutil

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

/// Represents a mounted DMG. Dropping this struct will detach the volume.
#[derive(Debug)]
pub struct MountPoint {
    pub path: PathBuf,
}

impl Drop for MountPoint {
    fn drop(&mut self) {
        if let Err(e) = detach(&self.path) {
            tracing::warn!(mount = %self.path.display(), "{e}");
        }
    }
}

/// Attach a DMG file read-only without showing it in Finder.
pub fn attach(dmg_path: &Path) -> Result<MountPoint> {
    let output = Command::new("hdiutil")
        .arg("attach")
        .arg("-nobrowse")
        .arg("-readonly")
        .arg("-noautoopen")
        .arg(dmg_path)
        .stdin(Stdio::null())
        .output()
        .context("Failed to execute hdiutil")?;

    if !output.status.success() {
        bail!(
            "hdiutil attach failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let path = parse_mount_point(&stdout).context("Could not find mount point in hdiutil output")?;
    tracing::debug!(dmg = %dmg_path.display(), mount = %path.display(), "attached");
    Ok(MountPoint { path })
}

/// Pull the `/Volumes/...` mount point out of `hdiutil attach` output.
///
/// Lines look like `/dev/disk4s1<TAB>Apple_HFS<TAB>/Volumes/Skype`; the
/// volume name may itself contain spaces.
fn parse_mount_point(stdout: &str) -> Option<PathBuf> {
    stdout.lines().find_map(|line| {
        line.find("/Volumes/")
            .map(|idx| PathBuf::from(line[idx..].trim_end()))
    })
}

/// Detach a volume, retrying while it is busy.
pub fn detach(mount_point: &Path) -> Result<()> {
    for _ in 0..3 {
        let status = Command::new("hdiutil")
            .arg("detach")
            .arg(mount_point)
            .arg("-force")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        if status.is_ok_and(|s| s.success()) {
            return Ok(());
        }
        std::thread::sleep(std::time::Duration::from_millis(500));
    }

    bail!("Failed to detach {}", mount_point.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_point_with_spaces() {
        let out = "/dev/disk4          \tGUID_partition_scheme          \t\n\
                   /dev/disk4s1        \tApple_HFS                      \t/Volumes/Skype Installer\n";
        assert_eq!(
            parse_mount_point(out),
            Some(PathBuf::from("/Volumes/Skype Installer"))
        );
    }

    #[test]
    fn no_mount_point() {
        assert_eq!(parse_mount_point("/dev/disk4\tGUID_partition_scheme\n"), None);
    }
}
