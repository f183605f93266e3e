//! Info command

use anyhow::{Context, Result};
use crossterm::style::Stylize;

use cask_core::state::StateDb;

use super::Settings;
use crate::ui::format_size;

/// Show a cask's manifest and, when installed, its receipt.
pub fn info(settings: &Settings, cask: &str, json: bool) -> Result<()> {
    let manifest = settings.manifest(cask)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    // Read-only lookup: do not create a database just to show info.
    let db_path = settings.layout.db_path();
    let receipt = if db_path.exists() {
        StateDb::open_at(&db_path)
            .context("Failed to open state database")?
            .get(manifest.token().as_str())?
    } else {
        None
    };

    let info = &manifest.cask;
    let lw = 12;

    println!();
    println!(
        "  {} {}",
        info.token.as_str().white().bold(),
        info.version.as_str().dark_grey()
    );
    println!("  {}", info.name);
    if let Some(desc) = &info.desc {
        println!("  {}", desc.as_str().dark_grey());
    }
    println!();
    println!("  {:<lw$}{}", "homepage", info.homepage);
    println!("  {:<lw$}{}", "url", manifest.download_url()?);
    println!("  {:<lw$}{}", "checksum", manifest.source.checksum);
    if let Some(appcast) = &manifest.source.appcast {
        println!("  {:<lw$}{appcast}", "appcast");
    }
    println!("  {:<lw$}{}", "app", manifest.install.app);
    if info.auto_updates {
        println!("  {:<lw$}{}", "updates", "self-updating");
    }
    if !manifest.zap.is_empty() {
        println!("  {:<lw$}{} paths", "zap", manifest.zap.len());
    }

    match receipt {
        Some(r) => {
            let dt = chrono::DateTime::from_timestamp(r.installed_at, 0)
                .unwrap_or_default()
                .format("%Y-%m-%d")
                .to_string();
            let size = if r.app_path.exists() {
                format_size(cask_core::io::extract::dir_size(&r.app_path))
            } else {
                "missing".to_string()
            };
            println!(
                "  {:<lw$}{} ({size}, {dt})",
                "installed",
                r.version
            );
        }
        None => println!("  {:<lw$}{}", "installed", "no".dark_grey()),
    }
    println!();
    Ok(())
}
