//! text2fx CLI
//!
//! Command-line interface for the text2fx effect engine.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use text2fx::cli::{commands, Cli, Commands};

fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    info!("text2fx v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Process {
            input,
            output,
            effect,
            params,
            sample_rate,
        } => commands::process(&input, &output, effect, &params, sample_rate),
        Commands::Batch {
            input_dir,
            output_dir,
            effect,
            params,
            sample_rate,
        } => commands::batch(&input_dir, &output_dir, effect, &params, sample_rate).map(|_| ()),
        Commands::Prompt {
            fx_type,
            instrument,
            instruction,
        } => commands::prompt(fx_type, &instrument, &instruction),
        Commands::Text2Fx {
            fx_type,
            instrument,
            instruction,
        } => commands::text2fx(fx_type, &instrument, &instruction),
    }
}
