//! History command

use anyhow::Result;
use comfy_table::Cell;

use cask_core::Reporter;

use super::Settings;
use crate::ui::table;

pub fn history(settings: &Settings, cask: &str) -> Result<()> {
    let ctx = settings.context()?;
    let token = cask.to_ascii_lowercase();
    let entries = ctx.state.with(|db| db.history(&token))?;

    if entries.is_empty() {
        ctx.reporter.info(&format!("No history for '{token}'"));
        return Ok(());
    }

    let mut t = table::listing(&["when", "action", "version", "result"]);
    for entry in entries {
        let when = chrono::DateTime::from_timestamp(entry.at, 0)
            .unwrap_or_default()
            .format("%Y-%m-%d %H:%M")
            .to_string();
        t.add_row(vec![
            table::dim_cell(when),
            Cell::new(&entry.action),
            Cell::new(entry.version.as_deref().unwrap_or("-")),
            if entry.success {
                Cell::new("ok").fg(comfy_table::Color::Green)
            } else {
                Cell::new("failed").fg(comfy_table::Color::Red)
            },
        ]);
    }
    table::print(&t);
    Ok(())
}
