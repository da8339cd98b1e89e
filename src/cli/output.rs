//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command. Data (names, paths, values)
//! goes to stdout unstyled so it can be piped; status lines go to stderr.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::cache::CacheSnapshot;
use crate::search::ValuedHit;
use crate::sync::SyncProgress;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    eprintln!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    eprintln!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    eprintln!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// One line per finished vault during a full sync.
pub fn progress(p: &SyncProgress<'_>) {
    let width = p.total.to_string().len();
    let mark = if p.ok {
        style("\u{2713}").green()
    } else {
        style("\u{2717}").red()
    };
    eprintln!(
        "{} {} {}",
        style(format!("[{:>width$}/{}]", p.completed, p.total)).dim(),
        mark,
        p.vault
    );
}

/// Print a table of cached vaults (Vault, Secrets).
pub fn print_vault_table(snapshot: &CacheSnapshot) {
    if snapshot.is_empty() {
        info("The cache holds no vaults.");
        tip("Run `akv update` to fetch vault names.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Vault", "Secrets"]);

    for (vault, entry) in snapshot.iter() {
        let count = match entry {
            Some(secrets) => secrets.len().to_string(),
            None => "?".to_string(),
        };
        table.add_row(vec![vault.to_string(), count]);
    }

    println!("{table}");
}

/// Print `path = value` lines; a failed fetch is shown on its own line.
pub fn print_valued_hits(hits: &[ValuedHit]) {
    for valued in hits {
        match &valued.value {
            None => println!("{}", valued.hit),
            Some(Ok(value)) => println!("{} = {}", valued.hit, value),
            Some(Err(e)) => println!("{} {}", valued.hit, style(format!("! {e}")).red()),
        }
    }
}
