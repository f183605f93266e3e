//! Cask installation.
//!
//! An install runs in four steps:
//!
//! - plan against the receipt database (fresh, upgrade, reinstall or no-op)
//! - fetch the artifact into the cache, verifying its digest
//! - stage it (mount the DMG or unpack the ZIP) and place the `.app` bundle
//! - record the receipt and a manifest snapshot under the Caskroom
//!
//! Re-installing the version that is already present is a no-op reported as
//! "already up to date".

use std::path::{Path, PathBuf};

use cask_schema::CaskManifest;

use crate::io::extract::{ArtifactFormat, dir_size, extract_zip, find_app, place_bundle};
use crate::io::{dmg, download};
use crate::{Context, InstallError};

/// Detail reported when the requested version is already in place.
pub const UP_TO_DATE: &str = "already up to date";

/// What an install will do, decided from the receipt database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallPlan {
    /// Nothing recorded for this token.
    Fresh,
    /// A different version is recorded.
    Upgrade { from: String },
    /// Same version, but forced or the bundle has gone missing.
    Reinstall,
    /// Same version recorded and its bundle is present.
    AlreadyInstalled,
}

impl std::fmt::Display for InstallPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fresh => f.write_str("install"),
            Self::Upgrade { from } => write!(f, "upgrade from {from}"),
            Self::Reinstall => f.write_str("reinstall"),
            Self::AlreadyInstalled => f.write_str(UP_TO_DATE),
        }
    }
}

/// Result of one install request.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub plan: InstallPlan,
    pub app_path: PathBuf,
    /// Bytes placed on disk; `None` when nothing was installed.
    pub size: Option<u64>,
}

/// Decide what installing `manifest` would do.
pub fn plan(ctx: &Context, manifest: &CaskManifest, force: bool) -> Result<InstallPlan, InstallError> {
    let token = manifest.token().as_str();
    let receipt = ctx.state.with(|db| db.get(token))?;

    Ok(match receipt {
        None => InstallPlan::Fresh,
        Some(r) if r.version != manifest.version().as_str() => InstallPlan::Upgrade { from: r.version },
        Some(r) if force || !r.app_path.exists() => InstallPlan::Reinstall,
        Some(_) => InstallPlan::AlreadyInstalled,
    })
}

/// Install one cask.
pub async fn install(
    ctx: &Context,
    manifest: &CaskManifest,
    force: bool,
) -> Result<InstallOutcome, InstallError> {
    manifest.validate()?;

    let token = manifest.token();
    let version = manifest.version();
    let app_path = ctx.config.appdir.join(&manifest.install.app);
    let plan = plan(ctx, manifest, force)?;

    if plan == InstallPlan::AlreadyInstalled {
        tracing::info!(%token, %version, "already installed");
        ctx.reporter.done(token, version, UP_TO_DATE, None);
        return Ok(InstallOutcome {
            plan,
            app_path,
            size: None,
        });
    }

    if ctx.dry_run {
        ctx.reporter
            .done(token, version, &format!("would {plan} (dry run)"), None);
        return Ok(InstallOutcome {
            plan,
            app_path,
            size: None,
        });
    }

    match perform(ctx, manifest, &plan, &app_path).await {
        Ok(size) => {
            ctx.state
                .with(|db| db.add_history(token.as_str(), "install", Some(version.as_str()), true))?;
            ctx.reporter.done(token, version, "installed", Some(size));
            Ok(InstallOutcome {
                plan,
                app_path,
                size: Some(size),
            })
        }
        Err(e) => {
            ctx.reporter.failed(token, version, &e.to_string());
            if let Err(db_err) = ctx
                .state
                .with(|db| db.add_history(token.as_str(), "install", Some(version.as_str()), false))
            {
                tracing::warn!("failed to record history: {db_err}");
            }
            Err(e)
        }
    }
}

async fn perform(
    ctx: &Context,
    manifest: &CaskManifest,
    plan: &InstallPlan,
    app_path: &Path,
) -> Result<u64, InstallError> {
    let token = manifest.token();
    let version = manifest.version();

    let url = manifest.download_url()?;
    let archive = download::fetch(&ctx.client, &ctx.layout, manifest, ctx.reporter.as_ref()).await?;

    let format = ArtifactFormat::detect(&url, &archive)?
        .ok_or_else(|| InstallError::UnsupportedFormat(url.clone()))?;

    ctx.reporter.installing(token, version);
    let staging = ctx.layout.caskroom_version(token, version);
    std::fs::create_dir_all(&staging)?;

    let job = StageJob {
        archive,
        staging: staging.clone(),
        app: manifest.install.app.clone(),
        target: app_path.to_path_buf(),
        strip_quarantine: ctx.config.strip_quarantine,
    };
    let size = installer_for(format).install(job).await?;

    // Snapshot the manifest so uninstall --zap works without the source tree.
    let snapshot = serde_json::to_string_pretty(manifest)
        .map_err(|e| InstallError::context("Failed to serialize manifest", e))?;
    std::fs::write(ctx.layout.metadata_path(token, version), snapshot)?;

    let checksum = manifest.source.checksum.to_string();
    ctx.state.with(|db| {
        db.record_install(token.as_str(), version.as_str(), &checksum, app_path)
    })?;

    if let InstallPlan::Upgrade { from } = plan {
        let old = ctx.layout.caskroom(token).join(from);
        if old.exists() {
            if let Err(e) = std::fs::remove_dir_all(&old) {
                tracing::warn!(path = %old.display(), "failed to clean old staging: {e}");
            }
        }
    }

    tracing::info!(%token, %version, path = %app_path.display(), "installed");
    Ok(size)
}

/// Everything an installer needs to put a bundle in place.
#[derive(Debug)]
struct StageJob {
    archive: PathBuf,
    staging: PathBuf,
    app: String,
    target: PathBuf,
    strip_quarantine: bool,
}

#[async_trait::async_trait]
trait Installer: Send + Sync {
    /// Place the bundle at `job.target`, returning its size in bytes.
    async fn install(&self, job: StageJob) -> Result<u64, InstallError>;
}

struct DmgInstaller;
struct ZipInstaller;

fn installer_for(format: ArtifactFormat) -> Box<dyn Installer> {
    match format {
        ArtifactFormat::Dmg => Box::new(DmgInstaller),
        ArtifactFormat::Zip => Box::new(ZipInstaller),
    }
}

#[async_trait::async_trait]
impl Installer for DmgInstaller {
    async fn install(&self, job: StageJob) -> Result<u64, InstallError> {
        run_blocking(move || {
            let mount = dmg::attach(&job.archive)?;
            let app = find_app(&mount.path, &job.app)?;
            // The volume is read-only, so the bundle is always copied.
            place_bundle(&app, &job.target, false)?;
            drop(mount);
            finish(&job)
        })
        .await
    }
}

#[async_trait::async_trait]
impl Installer for ZipInstaller {
    async fn install(&self, job: StageJob) -> Result<u64, InstallError> {
        run_blocking(move || {
            let unpacked = tempfile::Builder::new()
                .prefix(".unpack-")
                .tempdir_in(&job.staging)?;
            extract_zip(&job.archive, unpacked.path())?;
            let app = find_app(unpacked.path(), &job.app)?;
            place_bundle(&app, &job.target, true)?;
            finish(&job)
        })
        .await
    }
}

async fn run_blocking<F>(f: F) -> Result<u64, InstallError>
where
    F: FnOnce() -> Result<u64, InstallError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(res) => res,
        Err(e) => Err(InstallError::Other(format!("Task panic: {e}"))),
    }
}

fn finish(job: &StageJob) -> Result<u64, InstallError> {
    if job.strip_quarantine {
        strip_quarantine(&job.target);
    }
    Ok(dir_size(&job.target))
}

/// Remove the download quarantine flag so Gatekeeper does not prompt on first launch.
#[cfg(target_os = "macos")]
fn strip_quarantine(path: &Path) {
    let result = std::process::Command::new("xattr")
        .args(["-dr", "com.apple.quarantine"])
        .arg(path)
        .output();
    match result {
        Ok(out) if out.status.success() => {}
        Ok(out) => tracing::debug!(
            path = %path.display(),
            "xattr: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        ),
        Err(e) => tracing::warn!("failed to run xattr: {e}"),
    }
}

#[cfg(not(target_os = "macos"))]
fn strip_quarantine(path: &Path) {
    tracing::trace!(path = %path.display(), "quarantine attributes are macOS only");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Sandbox, demo_app_zip, demo_manifest};

    #[tokio::test]
    async fn installs_zip_and_is_idempotent() {
        let body = demo_app_zip();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/Demo-1.0.zip")
            .with_body(body.clone())
            .expect(1)
            .create_async()
            .await;

        let sandbox = Sandbox::new();
        let manifest = demo_manifest(&server.url(), "1.0", &body, "");

        let first = install(&sandbox.ctx, &manifest, false).await.unwrap();
        assert_eq!(first.plan, InstallPlan::Fresh);
        assert!(first.size.unwrap() > 0);
        let app = sandbox.app_path("Demo.app");
        assert!(app.join("Contents/Info.plist").exists());
        assert!(
            sandbox
                .ctx
                .layout
                .metadata_path(manifest.token(), manifest.version())
                .exists()
        );

        let receipt = sandbox.ctx.state.with(|db| db.get("demo")).unwrap().unwrap();
        assert_eq!(receipt.version, "1.0");
        assert_eq!(receipt.app_path, app);

        let second = install(&sandbox.ctx, &manifest, false).await.unwrap();
        assert_eq!(second.plan, InstallPlan::AlreadyInstalled);
        assert!(second.size.is_none());
        assert!(
            sandbox
                .reporter
                .events()
                .contains(&format!("done demo 1.0: {UP_TO_DATE}"))
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn force_and_upgrade_plans() {
        let body = demo_app_zip();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Regex(r"^/Demo-.*\.zip$".into()))
            .with_body(body.clone())
            .create_async()
            .await;

        let sandbox = Sandbox::new();
        let v1 = demo_manifest(&server.url(), "1.0", &body, "");
        install(&sandbox.ctx, &v1, false).await.unwrap();
        assert_eq!(plan(&sandbox.ctx, &v1, true).unwrap(), InstallPlan::Reinstall);

        let v2 = demo_manifest(&server.url(), "2.0", &body, "");
        let outcome = install(&sandbox.ctx, &v2, false).await.unwrap();
        assert_eq!(outcome.plan, InstallPlan::Upgrade { from: "1.0".into() });
        assert!(!sandbox.ctx.layout.caskroom(v1.token()).join("1.0").exists());

        let history = sandbox.ctx.state.with(|db| db.history("demo")).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|h| h.success));
    }

    #[tokio::test]
    async fn missing_bundle_triggers_reinstall() {
        let body = demo_app_zip();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/Demo-1.0.zip")
            .with_body(body.clone())
            .create_async()
            .await;

        let sandbox = Sandbox::new();
        let manifest = demo_manifest(&server.url(), "1.0", &body, "");
        install(&sandbox.ctx, &manifest, false).await.unwrap();
        std::fs::remove_dir_all(sandbox.app_path("Demo.app")).unwrap();

        let outcome = install(&sandbox.ctx, &manifest, false).await.unwrap();
        assert_eq!(outcome.plan, InstallPlan::Reinstall);
        assert!(sandbox.app_path("Demo.app").exists());
    }

    #[tokio::test]
    async fn dry_run_has_no_side_effects() {
        let body = demo_app_zip();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/Demo-1.0.zip")
            .with_body(body.clone())
            .expect(0)
            .create_async()
            .await;

        let mut sandbox = Sandbox::new();
        sandbox.ctx.dry_run = true;
        let manifest = demo_manifest(&server.url(), "1.0", &body, "");
        let outcome = install(&sandbox.ctx, &manifest, false).await.unwrap();
        assert_eq!(outcome.plan, InstallPlan::Fresh);
        assert!(!sandbox.app_path("Demo.app").exists());
        assert!(sandbox.ctx.state.with(|db| db.get("demo")).unwrap().is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn checksum_mismatch_records_failure() {
        let body = demo_app_zip();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/Demo-1.0.zip")
            .with_body("tampered")
            .create_async()
            .await;

        let sandbox = Sandbox::new();
        let manifest = demo_manifest(&server.url(), "1.0", &body, "");
        let err = install(&sandbox.ctx, &manifest, false).await.unwrap_err();
        assert!(matches!(
            err,
            InstallError::Download(download::DownloadError::ChecksumMismatch { .. })
        ));
        assert!(!sandbox.app_path("Demo.app").exists());

        let history = sandbox.ctx.state.with(|db| db.history("demo")).unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].success);
    }

    #[tokio::test]
    async fn invalid_manifest_is_rejected_before_download() {
        let sandbox = Sandbox::new();
        let mut manifest = demo_manifest("https://example.com", "1.0", b"x", "");
        manifest.install.app = "Demo".into();
        let err = install(&sandbox.ctx, &manifest, false).await.unwrap_err();
        assert!(matches!(err, InstallError::Invalid(_)));
    }
}
