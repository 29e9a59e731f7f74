//! Subcommand definitions and dispatch.

mod project;
mod run;
mod types;

use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum Commands {
    /// Create a `.conduit/` directory with starter configuration
    Init {
        /// Overwrite files in an existing `.conduit/` directory
        #[arg(long)]
        force: bool,

        /// Only write `config.toml` and the heartbeat runner
        #[arg(long)]
        minimal: bool,
    },

    /// Start every runner and block until Ctrl-C
    Run,

    /// Check the configuration without starting anything
    Validate,

    /// List configured runners and the triggers they observe
    List,

    /// List registered pipe, trigger and service types
    Types {
        /// Print the params schema of each type
        #[arg(long)]
        schema: bool,
    },
}

/// Route a parsed subcommand to its handler.
pub async fn handle_command(command: Commands, root: &Path) -> color_eyre::Result<()> {
    match command {
        Commands::Init { force, minimal } => project::init(root, force, minimal).await,
        Commands::Run => run::run(root).await,
        Commands::Validate => project::validate(root).await,
        Commands::List => project::list(root).await,
        Commands::Types { schema } => types::list_types(schema),
    }
}
