//! `akv update_all` — refresh vault names and every vault's secret names.

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;
use crate::sync::FULL_SYNC_WORKERS;

/// Execute the `update_all` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let engine = ctx.engine();

    output::info(&format!(
        "Fetching secret names ({FULL_SYNC_WORKERS} vaults at a time)..."
    ));
    let report = engine.full(|p| output::progress(&p))?;

    for failure in &report.failures {
        output::warning(&format!(
            "{}: {} (secrets left unknown)",
            failure.vault, failure.error
        ));
    }

    let secrets: usize = report
        .snapshot
        .iter()
        .filter_map(|(_, entry)| entry.as_ref().map(Vec::len))
        .sum();
    output::success(&format!(
        "Cache updated successfully! ({} vaults, {} secrets)",
        report.snapshot.len(),
        secrets
    ));

    if !report.added.is_empty() {
        output::info(&format!("New vaults: {}", report.added.join(", ")));
    }
    if !report.removed.is_empty() {
        output::info(&format!("Removed vaults: {}", report.removed.join(", ")));
    }
    if !report.failures.is_empty() {
        output::tip("Retry a single vault with `akv kv <vault> update`.");
    }

    Ok(())
}
