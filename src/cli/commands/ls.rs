//! `akv ls` — display cached vaults in a table.

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;

/// Execute the `ls` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let snapshot = ctx.engine().load()?;

    output::info(&format!("{} cached vault(s)", snapshot.len()));
    output::print_vault_table(&snapshot);

    Ok(())
}
