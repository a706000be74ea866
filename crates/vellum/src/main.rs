//! # vellum
//!
//! Vellum - build transform for mini-program templates.
//!
//! ## Name Origin
//!
//! **Vellum** is the prepared skin medieval scribes wrote on. Templates are
//! the surface; everything they reference gets pulled into the build.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `VELLUM_LOG=debug`).
const LOG_ENV: &str = "VELLUM_LOG";

#[derive(Parser)]
#[command(name = "vellum")]
#[command(about = "Dependency-extracting build transform for mini-program templates", long_about = None)]
#[command(version, disable_version_flag = true)]
struct Cli {
    /// Print version
    #[arg(short = 'v', short_alias = 'V', long, action = clap::ArgAction::Version)]
    version: (),
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform templates and write assets plus dependency modules (default command)
    #[command(visible_alias = "atelier")]
    Build(commands::build::BuildArgs),

    /// Print the dependencies of templates without writing anything
    Deps(commands::deps::DepsArgs),
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Build(args)) => commands::build::run(args),
        Some(Commands::Deps(args)) => commands::deps::run(args),
        None => {
            // Default to build command with default args
            commands::build::run(commands::build::BuildArgs::default());
        }
    }
}
