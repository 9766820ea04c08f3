pub mod commands;
pub mod handlers;

use clap::Parser;

use commands::{Cli, Commands};
use handlers::{InstallHandler, ResolveHandler};

pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Install {
            package,
            dir,
            deps_only,
            force,
            registry,
            output,
        } => {
            depot_logger::init_logger(output.quiet, output.debug);
            InstallHandler::install(&package, dir, deps_only, force, &registry, output)
        }
        Commands::Resolve {
            package,
            json,
            registry,
            output,
        } => {
            // Keep stdout clean for the map itself when asked for JSON.
            depot_logger::init_logger(output.quiet || json, output.debug);
            ResolveHandler::resolve(&package, json, &registry)
        }
    }
}
