//! `akv --complete` and `akv --list_commands` — machine-readable listings
//! for shell completion scripts.

use std::io::{self, Write};

use crate::cli::{Context, COMMAND_INVENTORY};
use crate::errors::Result;

/// Print cached vault names, one per line.
pub fn complete(ctx: &Context) -> Result<()> {
    let snapshot = ctx.engine().load()?;
    write_lines(snapshot.vault_names())
}

/// Print the static command inventory, one per line.
pub fn list_commands() -> Result<()> {
    write_lines(COMMAND_INVENTORY.iter().copied())
}

fn write_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
