use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vidsplit")]
#[command(author, version, about = "Split a video into fixed-length lossless clips")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a video into clips of a fixed length
    Split {
        /// Video file to split
        #[arg(required = true)]
        input: PathBuf,

        /// Length of each clip in whole seconds (default from config: 60)
        #[arg(short, long, allow_hyphen_values = true)]
        slice: Option<String>,

        /// Directory to write the clips into
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Probe a media file and display its duration and container
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
