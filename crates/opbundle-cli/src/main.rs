//! # opbundle CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use opbundle_cli::pull::{run_pull, PullArgs};
use opbundle_cli::validate::{run_validate, ValidateArgs};

/// Operator bundle validator.
///
/// Checks bundle directories (ClusterServiceVersion, CRDs, RBAC, metadata
/// and dependency declarations) before they are added to a catalog.
#[derive(Parser, Debug)]
#[command(name = "opbundle", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,

    /// YAML file overriding the bundle layout.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a bundle directory.
    Validate(ValidateArgs),

    /// Unpack a bundle image into a directory.
    Pull(PullArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let result = opbundle_cli::load_layout(cli.config.as_deref()).and_then(|layout| {
        tracing::debug!(?layout, "resolved bundle layout");
        match &cli.command {
            Commands::Validate(args) => run_validate(args, &layout),
            Commands::Pull(args) => run_pull(args, &layout),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
