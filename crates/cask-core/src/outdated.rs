//! Which installed casks have something newer available.

use cask_schema::Version;

use crate::feed::check_feed;
use crate::registry::CaskRegistry;
use crate::{Context, InstallError};

/// Where the newer version was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The manifest in the registry declares a newer version.
    Manifest,
    /// The manifest's appcast advertises a newer release.
    Feed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutdatedCask {
    pub token: String,
    pub installed: Version,
    pub available: Version,
    pub origin: Origin,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutdatedOptions {
    /// Include casks that update themselves.
    pub greedy: bool,
    /// Poll appcasts in addition to comparing manifest versions.
    pub check_feeds: bool,
}

/// Compare every receipt against the registry (and optionally the feeds).
///
/// Casks with no manifest in the registry are skipped. A feed that cannot
/// be fetched is reported as a warning and does not fail the listing.
pub async fn outdated(
    ctx: &Context,
    registry: &CaskRegistry,
    opts: OutdatedOptions,
) -> Result<Vec<OutdatedCask>, InstallError> {
    let receipts = ctx.state.with(|db| db.list())?;
    let mut found = Vec::new();

    for receipt in receipts {
        let Some(entry) = registry.find(&receipt.token) else {
            tracing::debug!(token = %receipt.token, "no manifest for installed cask");
            continue;
        };
        let manifest = &entry.manifest;
        if manifest.cask.auto_updates && !opts.greedy {
            continue;
        }

        let installed = Version::from(receipt.version.as_str());
        if manifest.version() > &installed {
            found.push(OutdatedCask {
                token: receipt.token,
                installed,
                available: manifest.version().clone(),
                origin: Origin::Manifest,
            });
            continue;
        }

        if !opts.check_feeds {
            continue;
        }
        match check_feed(&ctx.client, manifest).await {
            Ok(Some(status)) => {
                if let Some(latest) = status.latest.filter(|v| v > &installed) {
                    found.push(OutdatedCask {
                        token: receipt.token,
                        installed,
                        available: latest,
                        origin: Origin::Feed,
                    });
                }
            }
            Ok(None) => {}
            Err(e) => ctx
                .reporter
                .warning(&format!("{}: appcast check failed: {e}", receipt.token)),
        }
    }

    Ok(found)
}
