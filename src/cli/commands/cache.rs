//! Cache command - inspect or clear stored caches

use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::cli::CommandContext;
use crate::error::{PrecacheError, PrecacheResult};
use crate::host::RegistrationRecord;
use crate::storage::{CacheStorage, DiskStorage};
use console::style;
use std::io::{self, Write};

/// Execute the cache command
pub async fn execute(args: CacheArgs, ctx: &CommandContext) -> PrecacheResult<()> {
    let storage = ctx.storage().await?;

    match args.action {
        CacheAction::List { format } => list_caches(&storage, ctx, format).await,
        CacheAction::Show { name } => show_cache(&storage, &name).await,
        CacheAction::Clear { yes } => clear_all_caches(&storage, ctx, yes).await,
    }
}

/// List all stored caches
async fn list_caches(
    storage: &DiskStorage,
    ctx: &CommandContext,
    format: OutputFormat,
) -> PrecacheResult<()> {
    let names = storage.keys().await?;

    if names.is_empty() {
        println!("No caches found.");
        return Ok(());
    }

    let active = ctx.record().await?.map(|r| r.cache_name);
    let mut rows = Vec::with_capacity(names.len());
    for name in names {
        let entries = storage.entries(&name).await?.len();
        let is_active = active.as_deref() == Some(name.as_str());
        rows.push((name, entries, is_active));
    }

    match format {
        OutputFormat::Table => {
            println!("{:<40} {:<10} {:<10}", "CACHE", "ENTRIES", "STATE");
            println!("{}", "-".repeat(60));
            for (name, entries, is_active) in &rows {
                let state = if *is_active {
                    style("active").green().to_string()
                } else {
                    style("stale").dim().to_string()
                };
                println!("{:<40} {:<10} {:<10}", name, entries, state);
            }
            println!();
            println!("Total: {} cache(s)", rows.len());
        }
        OutputFormat::Json => {
            #[derive(serde::Serialize)]
            struct CacheJson<'a> {
                name: &'a str,
                entries: usize,
                active: bool,
            }

            let json: Vec<CacheJson<'_>> = rows
                .iter()
                .map(|(name, entries, active)| CacheJson {
                    name,
                    entries: *entries,
                    active: *active,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Plain => {
            for (name, _, _) in &rows {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

/// List the entries of one cache
async fn show_cache(storage: &DiskStorage, name: &str) -> PrecacheResult<()> {
    if !storage.has(name).await? {
        return Err(PrecacheError::CacheNotFound(name.to_string()));
    }

    let keys = storage.entries(name).await?;
    println!("{} ({} entries)", style(name).bold(), keys.len());
    for key in &keys {
        let size = storage
            .get(name, key)
            .await?
            .map(|r| r.body.len())
            .unwrap_or_default();
        println!("  {} {} ({} bytes)", style("•").cyan(), key, size);
    }

    Ok(())
}

/// Delete every cache and forget the registration
async fn clear_all_caches(
    storage: &DiskStorage,
    ctx: &CommandContext,
    skip_confirm: bool,
) -> PrecacheResult<()> {
    let names = storage.keys().await?;
    let has_record = ctx.record().await?.is_some();

    if names.is_empty() && !has_record {
        println!("No caches to clear.");
        return Ok(());
    }

    println!("This will remove {} cache(s) and the registration:", names.len());
    for name in &names {
        println!("  {} {}", style("•").red(), name);
    }
    println!();

    if !skip_confirm {
        print!("Are you sure? [y/N] ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            println!("Failed to read input, aborting.");
            return Ok(());
        }

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let mut removed = 0;
    for name in &names {
        if storage.delete(name).await? {
            removed += 1;
        }
    }
    RegistrationRecord::delete(&ctx.state_dir).await?;

    println!("{} cleared {} cache(s)", style("✓").green(), removed);

    Ok(())
}
