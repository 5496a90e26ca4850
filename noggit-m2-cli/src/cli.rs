//! Root CLI structure for noggit-m2

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "noggit-m2")]
#[command(about = "Inspect M2 models the way the editor loads them", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the extracted game data
    #[arg(short, long, global = true, env = "NOGGIT_DATA", default_value = ".")]
    pub data: PathBuf,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize a model and its companion files
    Info {
        /// Game path of the model, relative to the data directory
        model: String,
    },

    /// List the render passes with their derived shaders
    Passes {
        /// Game path of the model, relative to the data directory
        model: String,

        /// Print the passes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate the skeleton at a point in time
    Pose {
        /// Game path of the model, relative to the data directory
        model: String,

        /// Clip index
        #[arg(short, long, default_value = "0")]
        animation: usize,

        /// Time in milliseconds
        #[arg(short, long, default_value = "0")]
        time: u32,
    },
}
