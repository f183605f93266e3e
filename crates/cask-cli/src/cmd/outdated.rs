//! Outdated command

use anyhow::Result;
use comfy_table::Cell;

use cask_core::Reporter;
use cask_core::outdated::{Origin, OutdatedOptions, outdated as find_outdated};

use super::Settings;
use crate::ui::table;

pub async fn outdated(settings: &Settings, greedy: bool, feeds: bool) -> Result<()> {
    let ctx = settings.context()?;
    let registry = settings.registry()?;
    let list = find_outdated(
        &ctx,
        &registry,
        OutdatedOptions {
            greedy,
            check_feeds: feeds,
        },
    )
    .await?;

    if list.is_empty() {
        ctx.reporter.success("All casks are up to date");
        return Ok(());
    }

    let mut t = table::listing(&["token", "installed", "available", "source"]);
    for cask in &list {
        t.add_row(vec![
            table::token_cell(&cask.token),
            table::dim_cell(&cask.installed),
            Cell::new(&cask.available).fg(comfy_table::Color::Green),
            table::dim_cell(match cask.origin {
                Origin::Manifest => "manifest",
                Origin::Feed => "appcast",
            }),
        ]);
    }
    table::print(&t);
    Ok(())
}
