// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imagesync")]
#[command(about = "Keep a local image registry in sync with declared images and versions")]
#[command(version)]
pub struct Cli {
    /// Directory holding config.yaml (default: /etc/imagesync)
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the sync daemon until interrupted
    Run,

    /// Run a single sync pass and exit
    Sync,

    /// Write a template config.yaml into the home directory
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Show the configured repositories and target images
    Status,
}
