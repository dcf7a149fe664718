//! Status command - show the active registration

use crate::cli::args::{OutputFormat, StatusArgs};
use crate::cli::commands::{CHECK, WARN};
use crate::cli::CommandContext;
use crate::error::PrecacheResult;
use crate::storage::CacheStorage;
use console::style;

/// Execute the status command
pub async fn execute(args: StatusArgs, ctx: &CommandContext) -> PrecacheResult<()> {
    let Some(record) = ctx.record().await? else {
        println!("No active registration.");
        println!(
            "Configured version: {} (run: precache register)",
            ctx.config.worker.cache_name
        );
        return Ok(());
    };

    let storage = ctx.storage().await?;
    let entries = storage.entries(&record.cache_name).await?.len();
    let caches = storage.keys().await?;
    let outdated = record.cache_name != ctx.config.worker.cache_name;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "registration": record,
                "entries": entries,
                "caches": caches,
                "configured_cache_name": ctx.config.worker.cache_name,
                "outdated": outdated,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Plain => println!("{}", record.cache_name),
        OutputFormat::Table => {
            println!("{}", style("Registration").bold().cyan());
            println!("  {}Active:     {}", CHECK, style(&record.cache_name).green());
            println!("  State:      {}", record.state);
            println!("  Worker:     {}", record.worker_id);
            println!("  Scope:      {}", record.scope);
            println!("  Entries:    {}/{}", entries, record.manifest.len());
            println!(
                "  Installed:  {}",
                record.installed_at.format("%Y-%m-%d %H:%M:%S")
            );
            if let Some(at) = record.activated_at {
                println!("  Activated:  {}", at.format("%Y-%m-%d %H:%M:%S"));
            }
            println!("  Storage:    {} ({})", ctx.caches_dir().display(), storage.backend_name());

            let stale = caches.iter().filter(|c| **c != record.cache_name).count();
            if stale > 0 {
                println!("  {}{} stale cache(s) still stored", WARN, stale);
            }
            if outdated {
                println!();
                println!(
                    "{}Configured version {} is not registered yet (run: precache register)",
                    WARN,
                    style(&ctx.config.worker.cache_name).yellow()
                );
            }
        }
    }

    Ok(())
}
