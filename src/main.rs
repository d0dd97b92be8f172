mod citation;
mod cli;
mod commands;
mod error;
mod export;
mod extract;
mod markdown;
mod model;
mod service;
mod stats;
mod store;
mod template;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse(args) => commands::parse::run(args),
        Commands::Extract(args) => commands::extract::run(args),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Bibtex(args) => commands::bibtex::run(args),
        Commands::Export(args) => commands::export::run(args),
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Enhance(args) => commands::generate::run_enhance(args),
        Commands::Ingest(args) => commands::ingest::run(args),
        Commands::Report(args) => commands::report::run(args),
        Commands::Citation(args) => commands::citation::run(args),
        Commands::Template(args) => commands::library::run_template(args),
        Commands::Profile(args) => commands::library::run_profile(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
