//! Register command - install the configured cache version and activate it

use crate::cli::commands::{CHECK, CROSS, WARN};
use crate::cli::CommandContext;
use crate::error::PrecacheResult;
use console::style;

/// Execute the register command
pub async fn execute(ctx: &CommandContext) -> PrecacheResult<()> {
    let worker = ctx.config.worker.clone();
    let mut registration = ctx.registration().await?;

    if let Some(active) = registration.active() {
        println!(
            "Active: {} ({})",
            style(active.cache_name()).bold(),
            style(active.id()).dim()
        );
    }
    println!(
        "Installing {} from {}",
        style(&worker.cache_name).bold(),
        worker.scope
    );

    let outcome = match registration.register(worker).await {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("{}{}", CROSS, style("Install failed").red());
            if let Some(active) = registration.active() {
                println!("  {} remains active", active.cache_name());
            }
            return Err(e);
        }
    };

    println!(
        "{}Installed {} ({} entries)",
        CHECK,
        style(&outcome.install.cache_name).green(),
        outcome.install.entries
    );

    if let Some(activation) = &outcome.activation {
        for name in &activation.deleted {
            println!("  {} removed stale cache {}", style("•").cyan(), name);
        }
        for name in &activation.failed {
            println!("  {}could not remove stale cache {}", WARN, style(name).yellow());
        }
        println!(
            "{}Activated {}",
            CHECK,
            style(&outcome.install.cache_name).green()
        );
    }

    if let Some(record) = registration.record() {
        record.save(&ctx.state_dir).await?;
    }

    Ok(())
}
