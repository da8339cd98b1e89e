//! `akv completions` — generate shell completion scripts.
//!
//! Usage:
//!   akv completions bash > ~/.bash_completion.d/akv
//!   akv completions zsh
//!   akv completions fish
//!   akv completions powershell
//!
//! Bash and fish scripts also complete `akv kv <vault>` from the cache via
//! `akv --complete`, which never touches the network once a cache exists.

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::{AkvError, Result};

/// Wraps clap's `_akv` so the word after `kv` completes to cached vaults.
const BASH_VAULT_HOOK: &str = r#"
_akv_vaults() {
    if [[ ${COMP_CWORD} -eq 2 && "${COMP_WORDS[1]}" == "kv" ]]; then
        COMPREPLY=( $(compgen -W "$(akv --complete 2>/dev/null)" -- "${COMP_WORDS[COMP_CWORD]}") )
        return 0
    fi
    _akv "$@"
}
complete -F _akv_vaults -o bashdefault -o default akv
"#;

const FISH_VAULT_HOOK: &str = r#"
complete -c akv -n "__fish_seen_subcommand_from kv; and test (count (commandline -opc)) -eq 2" -f -a "(akv --complete 2>/dev/null)"
"#;

/// Execute the `completions` command.
pub fn execute(shell: &str) -> Result<()> {
    let script = render(parse_shell(shell)?);
    io::stdout().lock().write_all(&script)?;
    Ok(())
}

/// The full completion script for `shell`, vault hook included.
fn render(shell: Shell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let mut script = Vec::new();
    generate(shell, &mut cmd, "akv", &mut script);

    match shell {
        Shell::Bash => script.extend_from_slice(BASH_VAULT_HOOK.as_bytes()),
        Shell::Fish => script.extend_from_slice(FISH_VAULT_HOOK.as_bytes()),
        _ => {}
    }
    script
}

/// Parse a shell name string into a `Shell` enum.
fn parse_shell(name: &str) -> Result<Shell> {
    match name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        "powershell" | "ps" => Ok(Shell::PowerShell),
        "elvish" => Ok(Shell::Elvish),
        other => Err(AkvError::CommandFailed(format!(
            "unknown shell '{other}' — supported: bash, zsh, fish, powershell, elvish"
        ))),
    }
}
