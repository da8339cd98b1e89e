use clap::Parser;
use tracing_subscriber::EnvFilter;

use akv::cli::{Cli, Commands, Context};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        akv::cli::output::error(&e.to_string());
        if e.is_not_found() {
            akv::cli::output::tip("Run `akv update_all` if the cache may be stale.");
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> akv::errors::Result<()> {
    if cli.list_commands {
        return akv::cli::commands::discovery::list_commands();
    }

    // Completions need no cache or directory client.
    if let Some(Commands::Completions { ref shell }) = cli.command {
        return akv::cli::commands::completions::execute(shell);
    }

    let ctx = Context::from_cli(cli)?;

    if cli.complete {
        return akv::cli::commands::discovery::complete(&ctx);
    }

    match cli.command {
        Some(Commands::Update) => akv::cli::commands::update::execute(&ctx),
        Some(Commands::UpdateAll) => akv::cli::commands::update_all::execute(&ctx),
        Some(Commands::Kv {
            ref vault,
            ref action,
        }) => akv::cli::commands::kv::execute(&ctx, vault, action.as_ref()),
        Some(Commands::Search { ref pattern, mode }) => {
            akv::cli::commands::search::execute(&ctx, pattern, mode)
        }
        Some(Commands::Ls) => akv::cli::commands::ls::execute(&ctx),
        Some(Commands::Completions { .. }) => Ok(()),
        None => Err(akv::errors::AkvError::CommandFailed(
            "no command given — use `update` to refresh the cache, `--complete` for suggestions, or `--help`".into(),
        )),
    }
}

/// Filter used when neither `AKV_LOG` nor `--verbose` is given. Per-vault
/// sync failures are already shown by `cli::output`, so `warn` stays off.
const DEFAULT_LOG_FILTER: &str = "error";

/// Diagnostics go to stderr. `AKV_LOG` sets the filter; `--verbose` forces
/// debug. User-facing messages go through `cli::output` instead.
fn init_logging(verbose: bool) {
    let directives = log_directives(verbose, std::env::var("AKV_LOG").ok());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn log_directives(verbose: bool, env: Option<String>) -> String {
    if verbose {
        return "akv=debug".into();
    }
    env.filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.into())
}
