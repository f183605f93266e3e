//! Search command

use anyhow::Result;
use comfy_table::Cell;

use cask_core::Reporter;

use super::Settings;
use crate::ui::table;

/// Fuzzy search the configured manifest directories.
pub fn search(settings: &Settings, query: &str) -> Result<()> {
    let start = std::time::Instant::now();
    let registry = settings.registry()?;
    let results = registry.search(query);
    let output = settings.output();

    if results.is_empty() {
        output.info(&format!("No casks found matching '{query}'"));
        return Ok(());
    }

    let mut t = table::listing(&["token", "version", "name", "description"]);
    for entry in &results {
        let info = &entry.manifest.cask;
        t.add_row(vec![
            table::token_cell(info.token.as_str()),
            Cell::new(info.version.as_str()),
            Cell::new(&info.name),
            table::dim_cell(info.desc.as_deref().unwrap_or("")),
        ]);
    }
    table::print(&t);

    println!();
    println!(
        "SEARCH COMPLETE {}, elapsed {:.2}s",
        results.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
