//! `akv search` — match cached `vault/secret` paths.

use crate::cli::output;
use crate::cli::{Context, SearchMode};
use crate::errors::Result;
use crate::search;

/// Execute the `search` command.
pub fn execute(ctx: &Context, pattern: &str, mode: Option<SearchMode>) -> Result<()> {
    let snapshot = ctx.engine().load()?;
    let hits = search::search(&snapshot, pattern)?;

    match mode {
        None => {
            for hit in &hits {
                println!("{hit}");
            }
        }
        Some(SearchMode::Show) => {
            let valued = search::fetch_values(ctx.client(), hits);
            let failed = valued
                .iter()
                .filter(|v| matches!(v.value, Some(Err(_))))
                .count();
            output::print_valued_hits(&valued);
            if failed > 0 {
                output::warning(&format!("{failed} value(s) could not be fetched"));
            }
        }
    }

    Ok(())
}
