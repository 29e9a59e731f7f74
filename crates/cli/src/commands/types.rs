//! `conduit types`: what the built-in registry offers.

use colored::*;
use conduit_core::factory::{Registry, RenderableKind};

pub fn list_types(with_schema: bool) -> color_eyre::Result<()> {
    let registry = Registry::with_builtins();

    for (kind, title) in [
        (RenderableKind::Pipe, "Pipes:"),
        (RenderableKind::Trigger, "Triggers:"),
        (RenderableKind::Service, "Services:"),
    ] {
        println!("{}", title.bold());
        for key in registry.keys(kind) {
            println!("  {}", key.cyan());
            if with_schema {
                if let Some(schema) = registry.params_schema(key) {
                    let pretty = serde_json::to_string_pretty(&schema)?;
                    for line in pretty.lines() {
                        println!("    {}", line.dimmed());
                    }
                }
            }
        }
    }
    Ok(())
}
