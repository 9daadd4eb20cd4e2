//! Lofi CLI
//!
//! Command-line entry point for the lofi converter.

use anyhow::{bail, Context};
use clap::Parser;
use env_logger::Env;
use log::info;

use lofi::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Lofi v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Convert {
            inputs,
            out_dir,
            workers,
            effects,
        } => {
            let summary = commands::convert(&inputs, &out_dir, workers, &effects)
                .context("conversion could not start")?;
            if !summary.all_succeeded() {
                bail!("{} of {} track(s) failed", summary.failed, summary.succeeded + summary.failed);
            }
            Ok(())
        }
        Commands::ShowConfig { effects } => {
            commands::show_config(&effects).context("could not resolve effect settings")
        }
    }
}
