//! Validate command

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use crossterm::style::Stylize;

use cask_core::Reporter;
use cask_core::registry::CaskRegistry;
use cask_schema::{CaskManifest, MANIFEST_EXTENSION, ManifestError};

use super::Settings;

/// Validate manifest files, and every manifest inside given directories.
///
/// All files are checked before failing; tokens must also be unique across
/// everything passed in.
pub fn validate(settings: &Settings, paths: &[PathBuf]) -> Result<()> {
    let output = settings.output();
    let mut registry = CaskRegistry::default();
    let mut failures = 0usize;
    let files = expand(paths)?;

    for path in &files {
        let issues = match check_file(path) {
            Ok(manifest) => {
                let token = manifest.token().to_string();
                match registry.insert(path.clone(), manifest) {
                    Ok(_) => {
                        if !settings.global.quiet {
                            println!(
                                "  {} {:<20} {}",
                                "✓".green(),
                                token.cyan(),
                                path.display().to_string().dark_grey()
                            );
                        }
                        continue;
                    }
                    Err(e) => vec![e],
                }
            }
            Err(issues) => issues,
        };
        failures += 1;
        output.error(&path.display().to_string());
        for issue in &issues {
            eprintln!("      {issue}");
        }
    }

    if files.is_empty() {
        bail!("No manifests found");
    }
    if failures > 0 {
        bail!("{failures} of {} manifests failed validation", files.len());
    }
    let n = files.len();
    output.success(&format!("{n} manifest{} valid", if n == 1 { "" } else { "s" }));
    Ok(())
}

fn check_file(path: &Path) -> Result<CaskManifest, Vec<ManifestError>> {
    let manifest = CaskManifest::from_file(path).map_err(|e| vec![e])?;
    manifest.validate().map_err(|report| report.issues)?;
    Ok(manifest)
}

/// Files are taken as given; directories contribute their `*.toml` files.
fn expand(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.is_file() && p.extension().is_some_and(|x| x == MANIFEST_EXTENSION))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}
