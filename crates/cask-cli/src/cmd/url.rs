//! Url command

use anyhow::Result;

use super::Settings;

/// Print the download URL with the manifest's version substituted.
pub fn url(settings: &Settings, cask: &str) -> Result<()> {
    let manifest = settings.manifest(cask)?;
    println!("{}", manifest.download_url()?);
    Ok(())
}
