//! conduit CLI
//!
//! Scaffolds, validates and runs the pipelines declared under `.conduit/`.

mod commands;

use clap::Parser;
use commands::{handle_command, Commands};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "conduit")]
#[command(about = "Trigger-driven pipeline runner", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root containing the `.conduit/` directory
    #[arg(long, global = true, env = "CONDUIT_ROOT", default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conduit=info,conduit_core=info,conduit_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    handle_command(cli.command, &cli.root).await
}
