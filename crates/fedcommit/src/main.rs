//! fedcommit CLI - turns edge-device submissions into feature vectors and
//! ledger commitments.
//!
//! The binary is a thin host around `fedcommit-core`: it reads submissions
//! from disk, runs them through the pipeline, and prints the results as JSON.
//!
//! # Usage
//!
//! ```bash
//! # One image, identifiers on the command line
//! fedcommit process photo.jpg --device-id cam-7 --user-id alice --session-id s1
//!
//! # Wire-format JSON requests (a file or a directory of *.json)
//! fedcommit submit ./requests/ --format jsonl
//!
//! # Re-derive a commitment during a dispute
//! fedcommit verify photo.jpg --device-id cam-7 --user-id alice --hash <hex>
//!
//! # View configuration
//! fedcommit config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// fedcommit - telemetry ingestion and commitment for federated edge devices.
#[derive(Parser, Debug)]
#[command(name = "fedcommit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "FEDCOMMIT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one image through the pipeline
    Process(cli::process::ProcessArgs),

    /// Run wire-format JSON requests through the pipeline
    Submit(cli::submit::SubmitArgs),

    /// Check a commitment against its original inputs
    Verify(cli::verify::VerifyArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = startup_config(&cli)?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("fedcommit v{}", fedcommit_core::VERSION);

    let result = match cli.command {
        Commands::Process(args) => cli::process::execute(args, config).await,
        Commands::Submit(args) => cli::submit::execute(args, config).await,
        Commands::Verify(args) => cli::verify::execute(args).await,
        Commands::Config(args) => cli::config::execute(args, cli.config.as_deref()).await,
    };

    if let Err(e) = &result {
        if let Some(rejected) = e.downcast_ref::<cli::Rejected>() {
            eprintln!("Error: {rejected}");
            std::process::exit(rejected.exit_code());
        }
    }
    result
}

/// Load the configuration the command runs with.
///
/// An explicit `--config` that fails to load is fatal, except for the
/// `config` command itself, which must be able to create or repair the file.
/// Logging isn't initialized yet, so warnings go through eprintln.
fn startup_config(cli: &Cli) -> anyhow::Result<fedcommit_core::Config> {
    let strict = cli.config.is_some() && !matches!(cli.command, Commands::Config(_));
    match cli::load_config(cli.config.as_deref()) {
        Ok(config) => Ok(config),
        Err(e) if strict => Err(e),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `fedcommit config path`."
            );
            Ok(fedcommit_core::Config::default())
        }
    }
}
