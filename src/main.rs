// SPDX-License-Identifier: GPL-3.0-only

use capture_picker::constants::DEFAULT_SHOOT_TIMEOUT;
use capture_picker::terminal::{self, TerminalOptions};
use clap::{Parser, Subcommand};
use std::time::Duration;

mod cli;

#[derive(Parser)]
#[command(name = "capture-picker")]
#[command(about = "Single-photo capture picker")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive picker in the terminal
    Terminal {
        /// Skip the confirmation screen
        #[arg(long)]
        no_editing: bool,

        /// Ignore the volume button ('v')
        #[arg(long)]
        no_volume_button: bool,

        /// Disable switching to the front camera
        #[arg(long)]
        no_front_camera: bool,

        /// Discard every capture and return to the preview
        #[arg(long)]
        auto_retake: bool,

        /// Start on the front camera
        #[arg(long)]
        front: bool,

        /// Simulate refused camera access
        #[arg(long)]
        deny_camera: bool,
    },

    /// Take one picture without interaction and print its metadata
    Shoot {
        /// Give up after this many seconds
        #[arg(short, long, default_value_t = DEFAULT_SHOOT_TIMEOUT.as_secs())]
        timeout: u64,

        /// Skip the confirmation step
        #[arg(long)]
        no_editing: bool,

        /// Use the front camera
        #[arg(long)]
        front: bool,

        /// Make the first N captures fail
        #[arg(long, default_value = "0")]
        fail_captures: u32,
    },

    /// Show the configuration
    Config {
        /// Write the default configuration first
        #[arg(long)]
        reset: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=capture_picker=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Terminal {
            no_editing,
            no_volume_button,
            no_front_camera,
            auto_retake,
            front,
            deny_camera,
        } => terminal::run(TerminalOptions {
            no_editing,
            no_volume_button,
            no_front_camera,
            auto_retake,
            front,
            deny_camera,
        }),
        Commands::Shoot {
            timeout,
            no_editing,
            front,
            fail_captures,
        } => cli::shoot(cli::ShootOptions {
            timeout: Duration::from_secs(timeout),
            no_editing,
            front,
            fail_captures,
        }),
        Commands::Config { reset } => cli::show_config(reset),
    }
}
