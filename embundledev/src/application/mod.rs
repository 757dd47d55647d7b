pub mod handlers;

use std::process::ExitCode;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use embundle_core::error::Result;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Bundle {
            source,
            out,
            description,
            embed,
            host,
            section_name,
            deterministic,
            objcopy,
        } => handlers::handle_bundle(
            source,
            out,
            description,
            embed,
            host,
            section_name,
            deterministic,
            objcopy,
        ),
        Commands::Unbundle { dest, file, strict } => handlers::handle_unbundle(dest, file, strict),
        Commands::Info { file, json, strict } => handlers::handle_info(file, json, strict),
        Commands::List {
            file,
            hashes,
            json,
            strict,
        } => handlers::handle_list(file, hashes, json, strict),
        Commands::Cat {
            entry,
            file,
            start,
            len,
            strict,
        } => handlers::handle_cat(entry, file, start, len, strict),
        Commands::Check { file } => handlers::handle_check(&file),
    }
}
