//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::cli::commands::{CHECK, WARN};
use crate::cli::CommandContext;
use crate::config::{Config, ConfigManager};
use crate::error::PrecacheResult;

/// Execute the config command
pub async fn execute(args: ConfigArgs, ctx: &CommandContext) -> PrecacheResult<()> {
    let manager = ConfigManager::with_path(ctx.config_path.clone());

    match args.action {
        None | Some(ConfigAction::Show) => show_config(&ctx.config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(&manager, force).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> PrecacheResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> PrecacheResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        println!("{}Config already exists at {}", WARN, path.display());
        println!("  Use --force to overwrite");
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    println!("{}Configuration initialized: {}", CHECK, path.display());

    Ok(())
}
