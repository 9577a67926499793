// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Photo-booth kiosk core")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create booth folders, default config and fallback frame templates
    Init {
        /// Booth root directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// List working camera ports
    List,

    /// Take a single photo through the capture pipeline
    Photo {
        /// Camera port to use (default: camera_port from booth.json)
        #[arg(short, long)]
        camera: Option<usize>,

        /// Output file path (default: photo_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=photobooth=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { dir } => cli::init_booth(&dir),
        Commands::List => cli::list_cameras(),
        Commands::Photo { camera, output } => cli::take_photo(camera, output),
    }
}
