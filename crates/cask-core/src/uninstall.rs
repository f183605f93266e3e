//! Uninstall and zap.
//!
//! Uninstalling removes the placed `.app` bundle, the receipt and the
//! Caskroom staging directory. With `zap`, every entry of the manifest's
//! `[zap]` table is then processed independently (see [`crate::zap`]).

use std::path::PathBuf;

use cask_schema::{CaskManifest, Token, Version};

use crate::io::extract::remove_path;
use crate::zap::{Expander, ZapOptions, ZapReport, zap};
use crate::{Context, InstallError};

/// What happened to the bundle itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleOutcome {
    Removed(PathBuf),
    WouldRemove(PathBuf),
    /// The bundle was already gone.
    Missing(PathBuf),
    /// No receipt and no manifest: nothing to look for.
    Unknown,
}

#[derive(Debug, Clone)]
pub struct UninstallReport {
    pub token: Token,
    pub version: Option<Version>,
    pub bundle: BundleOutcome,
    pub zap: Option<ZapReport>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UninstallOptions {
    /// Also process the manifest's zap stanza.
    pub zap: bool,
    /// Proceed when no receipt exists (used by `cask zap`).
    pub allow_missing: bool,
}

/// Uninstall `token`, optionally zapping its user state.
///
/// `manifest` is used for the zap stanza and the bundle name; when absent
/// the snapshot written at install time is used instead.
pub fn uninstall(
    ctx: &Context,
    token: &Token,
    manifest: Option<&CaskManifest>,
    opts: UninstallOptions,
) -> Result<UninstallReport, InstallError> {
    let receipt = ctx.state.with(|db| db.get(token.as_str()))?;
    if receipt.is_none() && !opts.allow_missing {
        return Err(InstallError::NotInstalled(token.to_string()));
    }

    let version = receipt
        .as_ref()
        .map(|r| Version::from(r.version.as_str()))
        .or_else(|| manifest.map(|m| m.version().clone()));

    let snapshot = match (manifest, &version) {
        (None, Some(v)) => load_snapshot(ctx, token, v),
        _ => None,
    };
    let manifest = manifest.or(snapshot.as_ref());
    // Zapping needs the stanza; refuse before anything is removed.
    if opts.zap && manifest.is_none() {
        return Err(InstallError::UnknownCask(token.to_string()));
    }

    let display_version = version.clone().unwrap_or_default();
    ctx.reporter.removing(token, &display_version);

    let bundle_path = receipt
        .as_ref()
        .map(|r| r.app_path.clone())
        .or_else(|| manifest.map(|m| ctx.config.appdir.join(&m.install.app)));

    let bundle = match bundle_path {
        None => BundleOutcome::Unknown,
        Some(path) if path.symlink_metadata().is_err() => {
            tracing::debug!(path = %path.display(), "bundle already removed");
            BundleOutcome::Missing(path)
        }
        Some(path) if ctx.dry_run => BundleOutcome::WouldRemove(path),
        Some(path) => {
            remove_path(&path).map_err(|e| {
                InstallError::context("Failed to remove app bundle", format!("{}: {e}", path.display()))
            })?;
            BundleOutcome::Removed(path)
        }
    };

    let zap_report = manifest.filter(|_| opts.zap).map(|manifest| {
        let expander = Expander::new(&ctx.home);
        let zap_opts = ZapOptions {
            trash_dir: ctx.config.trash_dir(&ctx.home),
            dry_run: ctx.dry_run,
        };
        zap(&manifest.zap, &expander, &zap_opts)
    });

    if !ctx.dry_run {
        if receipt.is_some() {
            ctx.state.with(|db| db.remove(token.as_str()))?;
            ctx.state.with(|db| {
                db.add_history(
                    token.as_str(),
                    if opts.zap { "zap" } else { "uninstall" },
                    version.as_ref().map(Version::as_str),
                    true,
                )
            })?;
        }
        let caskroom = ctx.layout.caskroom(token);
        if caskroom.exists() {
            std::fs::remove_dir_all(&caskroom)?;
        }
    }

    let detail = match (&bundle, &zap_report) {
        (_, Some(z)) => format!(
            "{} zapped, {} skipped, {} failed",
            z.removed(),
            z.skipped(),
            z.failed()
        ),
        (BundleOutcome::WouldRemove(_), None) => "would remove (dry run)".to_string(),
        (BundleOutcome::Missing(_), None) => "bundle already gone".to_string(),
        _ => "removed".to_string(),
    };
    ctx.reporter.done(token, &display_version, &detail, None);

    Ok(UninstallReport {
        token: token.clone(),
        version,
        bundle,
        zap: zap_report,
    })
}

fn load_snapshot(ctx: &Context, token: &Token, version: &Version) -> Option<CaskManifest> {
    let path = ctx.layout.metadata_path(token, version);
    let content = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(path = %path.display(), "unreadable manifest snapshot: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::install;
    use crate::test_support::{Sandbox, demo_app_zip, demo_manifest};
    use crate::zap::{SkipReason, ZapOutcome};

    const ZAP: &str = r#"
[zap]
trash = ["~/Library/Application Support/Demo"]
delete = ["~/Library/Caches/com.example.demo"]
rmdir = ["~/Library/Demo Empty"]
"#;

    async fn installed(sandbox: &Sandbox, zap: &str) -> CaskManifest {
        let body = demo_app_zip();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/Demo-1.0.zip")
            .with_body(body.clone())
            .create_async()
            .await;
        let manifest = demo_manifest(&server.url(), "1.0", &body, zap);
        install(&sandbox.ctx, &manifest, false).await.unwrap();
        manifest
    }

    #[tokio::test]
    async fn uninstall_with_zap_skips_missing_paths() {
        let sandbox = Sandbox::new();
        let manifest = installed(&sandbox, ZAP).await;
        let support = sandbox.home().join("Library/Application Support/Demo");
        std::fs::create_dir_all(&support).unwrap();
        std::fs::write(support.join("state"), "x").unwrap();

        let report = uninstall(
            &sandbox.ctx,
            manifest.token(),
            None,
            UninstallOptions {
                zap: true,
                allow_missing: false,
            },
        )
        .unwrap();

        assert!(matches!(report.bundle, BundleOutcome::Removed(_)));
        assert!(!sandbox.app_path("Demo.app").exists());
        assert!(!support.exists());

        let zap = report.zap.unwrap();
        assert_eq!(zap.entries.len(), 3);
        assert!(matches!(zap.entries[0].outcome, ZapOutcome::Trashed { .. }));
        assert_eq!(
            zap.entries[1].outcome,
            ZapOutcome::Skipped { reason: SkipReason::NotFound }
        );
        assert_eq!(zap.failed(), 0);

        assert!(sandbox.ctx.state.with(|db| db.get("demo")).unwrap().is_none());
        assert!(!sandbox.ctx.layout.caskroom(manifest.token()).exists());
    }

    #[tokio::test]
    async fn empty_zap_removes_only_the_bundle() {
        let sandbox = Sandbox::new();
        let manifest = installed(&sandbox, "").await;
        let unrelated = sandbox.home().join("Library/Caches/com.example.demo");
        std::fs::create_dir_all(&unrelated).unwrap();

        let report = uninstall(
            &sandbox.ctx,
            manifest.token(),
            Some(&manifest),
            UninstallOptions {
                zap: true,
                allow_missing: false,
            },
        )
        .unwrap();

        assert!(matches!(report.bundle, BundleOutcome::Removed(_)));
        assert!(report.zap.unwrap().entries.is_empty());
        assert!(unrelated.exists());
    }

    #[tokio::test]
    async fn missing_bundle_is_not_an_error() {
        let sandbox = Sandbox::new();
        let manifest = installed(&sandbox, "").await;
        std::fs::remove_dir_all(sandbox.app_path("Demo.app")).unwrap();

        let report = uninstall(&sandbox.ctx, manifest.token(), None, UninstallOptions::default())
            .unwrap();
        assert!(matches!(report.bundle, BundleOutcome::Missing(_)));
        assert!(sandbox.ctx.state.with(|db| db.get("demo")).unwrap().is_none());
    }

    #[tokio::test]
    async fn zap_without_manifest_leaves_install_intact() {
        let sandbox = Sandbox::new();
        let manifest = installed(&sandbox, ZAP).await;
        let snapshot = sandbox
            .ctx
            .layout
            .metadata_path(manifest.token(), manifest.version());
        std::fs::remove_file(&snapshot).unwrap();

        let err = uninstall(
            &sandbox.ctx,
            manifest.token(),
            None,
            UninstallOptions {
                zap: true,
                allow_missing: false,
            },
        )
        .unwrap_err();

        assert!(matches!(err, InstallError::UnknownCask(_)));
        assert!(sandbox.app_path("Demo.app").exists());
        assert!(sandbox.ctx.state.with(|db| db.get("demo")).unwrap().is_some());
    }

    #[test]
    fn not_installed_is_an_error_unless_allowed() {
        let sandbox = Sandbox::new();
        let token = Token::new("demo");
        let err = uninstall(&sandbox.ctx, &token, None, UninstallOptions::default()).unwrap_err();
        assert!(matches!(err, InstallError::NotInstalled(_)));

        let manifest = demo_manifest("https://example.com", "1.0", b"x", ZAP);
        let report = uninstall(
            &sandbox.ctx,
            &token,
            Some(&manifest),
            UninstallOptions {
                zap: true,
                allow_missing: true,
            },
        )
        .unwrap();
        assert!(matches!(report.bundle, BundleOutcome::Missing(_)));
        assert_eq!(report.zap.unwrap().skipped(), 3);
    }

    #[tokio::test]
    async fn dry_run_keeps_everything() {
        let mut sandbox = Sandbox::new();
        let manifest = installed(&sandbox, "").await;
        sandbox.ctx.dry_run = true;

        let report = uninstall(&sandbox.ctx, manifest.token(), None, UninstallOptions::default())
            .unwrap();
        assert!(matches!(report.bundle, BundleOutcome::WouldRemove(_)));
        assert!(sandbox.app_path("Demo.app").exists());
        assert!(sandbox.ctx.state.with(|db| db.get("demo")).unwrap().is_some());
    }
}
