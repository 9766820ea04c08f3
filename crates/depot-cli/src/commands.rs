use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use depot_constants::{BIN_NAME, DESCRIPTION, VERSION};

#[derive(Parser)]
#[command(name = BIN_NAME)]
#[command(version = VERSION)]
#[command(propagate_version = true)]
#[command(about = DESCRIPTION, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolves a package's dependency tree and unpacks every package
    #[command(aliases = ["i", "add"])]
    Install {
        /// Package to install (e.g. express, express@4.18.2, @types/node@^20.0.0)
        package: String,
        /// Directory packages are unpacked into
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Install only the dependencies, not the package itself
        #[arg(long = "deps-only")]
        deps_only: bool,
        /// Replace package directories left by a previous run
        #[arg(short = 'f', long = "force")]
        force: bool,
        #[command(flatten)]
        registry: RegistryArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Prints the flat dependency map without downloading anything
    Resolve {
        /// Package to resolve (e.g. express@4.18.2)
        package: String,
        /// Print the map as a JSON object
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        registry: RegistryArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct RegistryArgs {
    /// Registry base URL
    #[arg(long)]
    pub registry: Option<String>,
    /// Maximum concurrent registry requests
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,
    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug, Default, Clone, Copy)]
pub struct OutputArgs {
    /// Enable debug mode for verbose output
    #[arg(long)]
    pub debug: bool,
    /// Only print errors
    #[arg(short = 'q', long, conflicts_with = "debug")]
    pub quiet: bool,
}
