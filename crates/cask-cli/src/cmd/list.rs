//! List command

use anyhow::Result;

use cask_core::Reporter;
use cask_core::io::extract::dir_size;

use super::Settings;
use crate::ui::{format_size, table};

/// List installed casks from the receipt database.
pub fn list(settings: &Settings) -> Result<()> {
    let ctx = settings.context()?;
    let receipts = ctx.state.with(|db| db.list())?;

    if receipts.is_empty() {
        ctx.reporter.info("No casks installed.");
        return Ok(());
    }

    let mut t = table::listing(&["token", "version", "size", "installed", "app"]);
    let mut total = 0;
    for r in &receipts {
        let size = if r.app_path.exists() { dir_size(&r.app_path) } else { 0 };
        total += size;
        let date = chrono::DateTime::from_timestamp(r.installed_at, 0)
            .unwrap_or_default()
            .format("%Y-%m-%d")
            .to_string();
        let app = if r.app_path.exists() {
            r.app_path.display().to_string()
        } else {
            format!("{} (missing)", r.app_path.display())
        };
        t.add_row(vec![
            table::token_cell(&r.token),
            comfy_table::Cell::new(&r.version),
            table::right_cell(format_size(size)),
            table::dim_cell(date),
            table::dim_cell(app),
        ]);
    }
    table::print(&t);
    println!();
    println!("  {} casks, {}", receipts.len(), format_size(total));
    Ok(())
}
