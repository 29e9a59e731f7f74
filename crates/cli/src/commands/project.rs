//! Handlers that only read or write configuration.

use colored::*;
use color_eyre::eyre::{eyre, WrapErr};
use conduit_core::config::loader::load_config;
use conduit_core::factory::Registry;
use conduit_core::init::{generate_conduit_structure, InitOptions};
use std::path::Path;

pub async fn init(root: &Path, force: bool, minimal: bool) -> color_eyre::Result<()> {
    let written = generate_conduit_structure(InitOptions {
        target_dir: root.to_path_buf(),
        force,
        minimal,
    })
    .await?;

    println!("{}", "✓ Project initialized".green().bold());
    for path in &written {
        let shown = path.strip_prefix(root).unwrap_or(path);
        println!("  {}", shown.display());
    }
    println!();
    println!("Next: {} to check it, {} to start it", "conduit validate".cyan(), "conduit run".cyan());
    Ok(())
}

/// Load and statically validate the project.
///
/// # Errors
///
/// Any load error, or the first configuration error found.
pub async fn validate(root: &Path) -> color_eyre::Result<()> {
    let config = load_config(root)
        .await
        .wrap_err_with(|| format!("Failed to load configuration from {}", root.display()))?;

    let runners = config.runners.len();
    let services = config.services.len();
    let orchestrator = config.into_orchestrator(Registry::with_builtins());

    if let Err(err) = orchestrator.validate() {
        println!("{} {}", "✗".red().bold(), err);
        return Err(eyre!("configuration is invalid"));
    }

    println!(
        "{} {} runner(s) and {} service(s) are valid",
        "✓".green().bold(),
        runners,
        services
    );
    Ok(())
}

pub async fn list(root: &Path) -> color_eyre::Result<()> {
    let config = load_config(root).await?;

    if config.runners.is_empty() {
        println!("{}", "No runners configured".yellow());
        return Ok(());
    }

    println!("{}", "Runners:".bold());
    for runner in &config.runners {
        println!(
            "  {} {} ({} step(s))",
            runner.runner_id().cyan().bold(),
            format!("use: {}", runner.run.uses).dimmed(),
            runner.run.walk().len() - 1
        );
        if runner.on.is_empty() {
            println!("    {}", "no triggers".yellow());
        }
        for trigger in &runner.on {
            println!("    on {} ({})", trigger.id.green(), trigger.uses);
        }
    }

    if !config.services.is_empty() {
        println!();
        println!("{}", "Services:".bold());
        for service in &config.services {
            println!("  {} {}", service.id.cyan().bold(), format!("use: {}", service.uses).dimmed());
        }
    }
    Ok(())
}
