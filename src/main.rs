//! precache - Offline-first precaching proxy
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use precache::cli::args::ConfigAction;
use precache::cli::{Cli, CommandContext, Commands};
use precache::config::{Config, ConfigManager};
use precache::error::PrecacheResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging: 0 = warn, 1 = info, 2+ = debug. RUST_LOG wins when set.
fn init_tracing(verbose: u8, config: &Config) {
    let level = match verbose {
        0 if config.general.verbose => "precache=info",
        0 => "precache=warn",
        1 => "precache=info",
        _ => "precache=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

async fn run() -> PrecacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // config init must work even when the existing file does not parse
    let config = match cli.command {
        Commands::Config(ref args) if matches!(args.action, Some(ConfigAction::Init { .. })) => {
            Config::default()
        }
        _ => config_manager.load().await?,
    };

    init_tracing(cli.verbose, &config);
    debug!("Using config {}", config_manager.path().display());

    let ctx = CommandContext::new(config, config_manager.path().to_path_buf(), cli.state_dir);
    debug!("Using state directory {}", ctx.state_dir.display());

    match cli.command {
        Commands::Register => precache::cli::commands::register(&ctx).await,
        Commands::Fetch(args) => precache::cli::commands::fetch(args, &ctx).await,
        Commands::Status(args) => precache::cli::commands::status(args, &ctx).await,
        Commands::Cache(args) => precache::cli::commands::cache(args, &ctx).await,
        Commands::Config(args) => precache::cli::commands::config(args, &ctx).await,
    }
}
