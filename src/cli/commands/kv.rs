//! `akv kv <vault> ...` — list, show, refresh and write one vault's secrets.

use crate::cli::output;
use crate::cli::{Context, KvAction};
use crate::errors::{AkvError, Result};
use crate::search::{self, SearchHit};

/// Execute a `kv` action. No action means `ls`.
pub fn execute(ctx: &Context, vault: &str, action: Option<&KvAction>) -> Result<()> {
    match action {
        None | Some(KvAction::Ls) => ls(ctx, vault),
        Some(KvAction::Show { secret }) => show(ctx, vault, secret.as_deref()),
        Some(KvAction::Update) => update(ctx, vault),
        Some(KvAction::Add { secret, value }) => add(ctx, vault, secret, value),
        Some(KvAction::Edit { secret, value }) => edit(ctx, vault, secret, value),
    }
}

/// Print the vault's cached secret names, fetching them first if they
/// were never cached.
fn ls(ctx: &Context, vault: &str) -> Result<()> {
    let secrets = known_secrets(ctx, vault)?;

    if secrets.is_empty() {
        output::info(&format!("Vault '{vault}' has no secrets."));
        return Ok(());
    }
    for secret in &secrets {
        println!("{secret}");
    }
    Ok(())
}

fn show(ctx: &Context, vault: &str, secret: Option<&str>) -> Result<()> {
    match secret {
        Some(secret) => {
            let engine = ctx.engine();
            let snapshot = engine.load()?;
            match snapshot.entry(vault) {
                None => return Err(AkvError::VaultNotCached(vault.to_string())),
                Some(Some(secrets)) if !secrets.iter().any(|s| s == secret) => {
                    return Err(AkvError::SecretNotCached {
                        vault: vault.to_string(),
                        secret: secret.to_string(),
                    });
                }
                // Unknown secrets: let the service decide.
                Some(_) => {}
            }
            let value = ctx.client().get_secret_value(vault, secret)?;
            println!("{value}");
        }
        None => {
            let hits = known_secrets(ctx, vault)?
                .into_iter()
                .map(|s| SearchHit {
                    vault: vault.to_string(),
                    secret: Some(s),
                })
                .collect();
            let valued = search::fetch_values(ctx.client(), hits);
            if valued.is_empty() {
                output::info(&format!("Vault '{vault}' has no secrets."));
            }
            output::print_valued_hits(&valued);
        }
    }
    Ok(())
}

fn update(ctx: &Context, vault: &str) -> Result<()> {
    let snapshot = ctx.engine().single_vault(vault)?;
    let count = snapshot
        .entry(vault)
        .and_then(|e| e.as_ref().map(Vec::len))
        .unwrap_or(0);

    output::success(&format!("Vault '{vault}' updated ({count} secrets)"));
    Ok(())
}

fn add(ctx: &Context, vault: &str, secret: &str, value: &str) -> Result<()> {
    if cached_secrets(ctx, vault)?.is_some_and(|s| s.iter().any(|s| s == secret)) {
        return Err(AkvError::CommandFailed(format!(
            "secret '{secret}' already exists in '{vault}' (use `akv kv {vault} edit`)"
        )));
    }

    output::warning("Value provided on command line — it may appear in shell history.");
    ctx.client().set_secret_value(vault, secret, value)?;
    ctx.engine().single_vault(vault)?;

    output::success(&format!("Secret '{secret}' added to '{vault}'"));
    Ok(())
}

fn edit(ctx: &Context, vault: &str, secret: &str, value: &str) -> Result<()> {
    if cached_secrets(ctx, vault)?.is_some_and(|s| !s.iter().any(|s| s == secret)) {
        return Err(AkvError::SecretNotCached {
            vault: vault.to_string(),
            secret: secret.to_string(),
        });
    }

    output::warning("Value provided on command line — it may appear in shell history.");
    ctx.client().set_secret_value(vault, secret, value)?;
    ctx.engine().single_vault(vault)?;

    output::success(&format!("Secret '{secret}' updated in '{vault}'"));
    Ok(())
}

/// The vault's secret names; a single-vault sync fills them in if the
/// cache only knows the vault exists.
fn known_secrets(ctx: &Context, vault: &str) -> Result<Vec<String>> {
    let engine = ctx.engine();
    let snapshot = engine.load()?;

    match snapshot.entry(vault) {
        None => Err(AkvError::VaultNotCached(vault.to_string())),
        Some(Some(secrets)) => Ok(secrets.clone()),
        Some(None) => {
            output::info(&format!("Secrets of '{vault}' not cached yet, fetching..."));
            let refreshed = engine.single_vault(vault)?;
            Ok(refreshed.entry(vault).cloned().flatten().unwrap_or_default())
        }
    }
}

/// Cached secret names for `vault`, without triggering any sync.
/// `None` if there is no cache file or the vault's secrets are unknown.
fn cached_secrets(ctx: &Context, vault: &str) -> Result<Option<Vec<String>>> {
    Ok(ctx
        .store
        .read()?
        .and_then(|snapshot| snapshot.entry(vault).cloned().flatten()))
}
