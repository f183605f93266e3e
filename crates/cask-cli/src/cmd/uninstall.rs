//! Uninstall and zap commands

use anyhow::Result;
use crossterm::style::{Color, Stylize};

use cask_core::Reporter;
use cask_core::uninstall::{UninstallOptions, uninstall as uninstall_cask};
use cask_core::zap::{ZapEntry, ZapOutcome, ZapReport};
use cask_schema::Token;

use super::Settings;
use crate::ui::Theme;

/// Remove an installed cask, optionally zapping its user data.
pub fn uninstall(settings: &Settings, cask: &str, zap: bool) -> Result<()> {
    run(
        settings,
        cask,
        UninstallOptions {
            zap,
            allow_missing: false,
        },
    )
}

/// Remove a cask's bundle (if present) and everything in its zap table.
pub fn zap(settings: &Settings, cask: &str) -> Result<()> {
    run(
        settings,
        cask,
        UninstallOptions {
            zap: true,
            allow_missing: true,
        },
    )
}

fn run(settings: &Settings, cask: &str, opts: UninstallOptions) -> Result<()> {
    let ctx = settings.context()?;
    ctx.reporter.section(if opts.zap { "Zapping" } else { "Removing" });

    // A manifest is optional: the install-time snapshot covers installed casks.
    let manifest = match settings.manifest(cask) {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::debug!("no manifest for {cask}: {e:#}");
            None
        }
    };
    let token = manifest
        .as_ref()
        .map_or_else(|| Token::new(cask), |m| m.token().clone());

    let report = uninstall_cask(&ctx, &token, manifest.as_ref(), opts)?;

    if let Some(zap) = &report.zap {
        if !settings.global.quiet {
            print_zap(zap);
        }
    }
    Ok(())
}

fn print_zap(report: &ZapReport) {
    let theme = Theme::default();
    for entry in &report.entries {
        let path = entry
            .path
            .as_ref()
            .map_or_else(|| entry.pattern.clone(), |p| p.display().to_string());
        let (icon, color, detail) = outcome_style(&theme, entry);
        println!(
            "      {} {:<7} {path} {}",
            icon.with(color),
            entry.action.to_string(),
            detail.with(theme.colors.secondary)
        );
    }
}

fn outcome_style(theme: &Theme, entry: &ZapEntry) -> (&'static str, Color, String) {
    let (icons, colors) = (&theme.icons, &theme.colors);
    match &entry.outcome {
        ZapOutcome::Removed => (icons.success, colors.success, "removed".to_string()),
        ZapOutcome::Trashed { .. } => (icons.success, colors.success, "moved to Trash".to_string()),
        ZapOutcome::WouldRemove => (
            icons.skipped,
            colors.secondary,
            format!("would {} (dry run)", entry.action),
        ),
        ZapOutcome::Skipped { reason } => {
            (icons.skipped, colors.secondary, format!("skipped: {reason}"))
        }
        ZapOutcome::Failed { error } => (icons.error, colors.error, format!("failed: {error}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cask_core::zap::SkipReason;
    use cask_schema::ZapAction;

    fn entry(outcome: ZapOutcome) -> ZapEntry {
        ZapEntry {
            pattern: "~/Library/Caches/com.skype.skype".to_string(),
            action: ZapAction::Trash,
            path: None,
            outcome,
        }
    }

    #[test]
    fn outcomes_use_theme_icons() {
        let theme = Theme::default();

        let (icon, color, detail) = outcome_style(
            &theme,
            &entry(ZapOutcome::Skipped {
                reason: SkipReason::NotFound,
            }),
        );
        assert_eq!(icon, theme.icons.skipped);
        assert_eq!(color, theme.colors.secondary);
        assert!(detail.starts_with("skipped"));

        let (icon, _, _) = outcome_style(&theme, &entry(ZapOutcome::Removed));
        assert_eq!(icon, theme.icons.success);

        let (icon, color, detail) = outcome_style(
            &theme,
            &entry(ZapOutcome::Failed {
                error: "permission denied".to_string(),
            }),
        );
        assert_eq!(icon, theme.icons.error);
        assert_eq!(color, theme.colors.error);
        assert_eq!(detail, "failed: permission denied");
    }
}
