//! Main entry point for the noggit-m2 CLI

mod cli;
mod commands;
mod utils;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    } else if cli.quiet {
        log::set_max_level(log::LevelFilter::Error);
    }

    let files = commands::open_data(&cli.data)?;
    match cli.command {
        Commands::Info { model } => commands::info::execute(&files, &model),
        Commands::Passes { model, json } => commands::passes::execute(&files, &model, json),
        Commands::Pose {
            model,
            animation,
            time,
        } => commands::pose::execute(&files, &model, animation, time),
    }
}
