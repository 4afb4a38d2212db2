//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate C++ wrapper glue from header trees
#[derive(Parser, Debug)]
#[command(name = "bindsmith")]
#[command(about = "Generate C++ wrapper glue from header trees")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Platform section of the configuration to apply
    #[arg(long, global = true)]
    pub platform: Option<String>,

    /// Number of parallel workers (defaults to one per core)
    #[arg(short = 'n', long, global = true)]
    pub njobs: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Wipe prior output before generating
    #[arg(short, long, global = true)]
    pub clean: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse headers and write the raw model artifact
    Parse {
        /// Configuration file path
        config: PathBuf,

        /// Output path for the model artifact
        output: PathBuf,
    },

    /// Apply the configuration-driven transform to a model artifact
    Transform {
        /// Configuration file path
        config: PathBuf,

        /// Input model artifact
        input: PathBuf,

        /// Output path for the transformed artifact
        output: PathBuf,
    },

    /// Sort a transformed model and emit the wrapper sources
    Generate {
        /// Configuration file path
        config: PathBuf,

        /// Input model artifact
        input: PathBuf,
    },

    /// Re-parse generated sources and report files with syntax errors
    Validate {
        /// Configuration file path
        config: PathBuf,

        /// Folder holding generated sources
        folder: PathBuf,
    },

    /// Parse, transform and generate in one run
    All {
        /// Configuration file path
        config: PathBuf,
    },
}
