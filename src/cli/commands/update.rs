//! `akv update` / `akv sync` — refresh the cached vault names.

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;

/// Execute the `update` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let engine = ctx.engine();
    let snapshot = engine.names_only()?;

    output::success(&format!(
        "Cache updated successfully! ({} vaults)",
        snapshot.len()
    ));
    output::tip("Run `akv update_all` to also cache secret names.");

    Ok(())
}
