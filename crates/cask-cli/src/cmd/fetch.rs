//! Fetch command

use anyhow::Result;
use cask_core::Reporter;
use cask_core::io::download;

use super::Settings;

/// Download and verify artifacts into the cache without installing them.
pub async fn fetch(settings: &Settings, casks: &[String]) -> Result<()> {
    let ctx = settings.context()?;
    let start = std::time::Instant::now();
    ctx.reporter.section("Fetching");

    let mut fetched = 0;
    for cask in casks {
        let manifest = settings.manifest(cask)?;
        manifest.validate()?;
        if ctx.dry_run {
            ctx.reporter.done(
                manifest.token(),
                manifest.version(),
                &format!("would fetch {} (dry run)", manifest.download_url()?),
                None,
            );
            continue;
        }
        let path = download::fetch(&ctx.client, &ctx.layout, &manifest, ctx.reporter.as_ref()).await?;
        let size = std::fs::metadata(&path).map(|m| m.len()).ok();
        ctx.reporter
            .done(manifest.token(), manifest.version(), &path.display().to_string(), size);
        fetched += 1;
    }

    if fetched > 0 {
        ctx.reporter
            .summary(fetched, "fetch", start.elapsed().as_secs_f64());
    }
    Ok(())
}
