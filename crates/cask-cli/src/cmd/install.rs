//! Install command

use std::time::Instant;

use anyhow::{Result, bail};

use cask_core::Reporter;
use cask_core::install::install as install_cask;

use super::Settings;

/// Install each cask in turn. Every cask is attempted; the command fails if any did.
pub async fn install(settings: &Settings, casks: &[String], force: bool) -> Result<()> {
    let ctx = settings.context()?;
    let start = Instant::now();
    ctx.reporter.section("Installing");

    let mut installed = 0;
    let mut failed = 0;
    for cask in casks {
        let manifest = match settings.manifest(cask) {
            Ok(m) => m,
            Err(e) => {
                ctx.reporter.error(&format!("{e:#}"));
                failed += 1;
                continue;
            }
        };
        match install_cask(&ctx, &manifest, force).await {
            Ok(outcome) if outcome.size.is_some() => installed += 1,
            Ok(outcome) => {
                tracing::debug!(token = %manifest.token(), plan = %outcome.plan, "nothing installed");
            }
            Err(e) => {
                tracing::debug!("install failed: {e:?}");
                failed += 1;
            }
        }
    }

    if installed > 0 {
        ctx.reporter
            .summary(installed, "install", start.elapsed().as_secs_f64());
    }
    if failed > 0 {
        bail!("{failed} of {} casks failed to install", casks.len());
    }
    Ok(())
}
