//! `conduit run`: start the orchestrator and report runs as they finish.

use colored::*;
use conduit_core::config::loader::load_config;
use conduit_core::factory::Registry;
use conduit_protocol::ipc::Event;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn run(root: &Path) -> color_eyre::Result<()> {
    let config = load_config(root).await?;
    let timeout = Duration::from_secs(config.global.shutdown_timeout_secs);

    let (events_tx, mut events_rx) = mpsc::channel::<Event>(64);
    let mut orchestrator = config
        .into_orchestrator(Registry::with_builtins())
        .with_events(events_tx);

    orchestrator.start()?;
    if orchestrator.trigger_ids().is_empty() {
        warn!("No triggers configured, nothing will run");
    }
    info!("Press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(event) = events_rx.recv() => print_event(&event),
        }
    }

    info!("Shutting down");
    if !orchestrator.shutdown(timeout).await {
        warn!(timeout_secs = timeout.as_secs(), "Some runs did not finish in time");
    }

    while let Ok(event) = events_rx.try_recv() {
        print_event(&event);
    }
    Ok(())
}

fn print_event(event: &Event) {
    match event {
        Event::RunStarted { runner_id, trigger_id, .. } => {
            println!("{} {} (on {})", "▶".blue(), runner_id.bold(), trigger_id);
        }
        Event::RunCompleted { runner_id, result, .. } => {
            let mark = if result.has_failed() { "✗".red() } else { "✓".green() };
            println!("{} {} {}", mark, runner_id.bold(), result.state());
            for line in result.message.lines() {
                println!("    {}", line.dimmed());
            }
        }
        Event::RunFailed { runner_id, error, fatal, .. } => {
            let label = if *fatal { "disabled" } else { "errored" };
            println!("{} {} {}: {}", "✗".red().bold(), runner_id.bold(), label.red(), error);
        }
    }
}
