// SPDX-License-Identifier: AGPL-3.0-or-later
//! filemux CLI
//!
//! Drives a router built from a TOML config: every path given on the
//! command line lives in the unified namespace (`/<mount>/...`).

mod commands;

use clap::{Parser, Subcommand};
use filemux_core::FileStorage;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "filemux")]
#[command(author, version, about = "filemux - one namespace over many storage backends", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the platform config dir)
    #[arg(short, long, global = true, env = "FILEMUX_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured mounts
    Mounts,

    /// List files under a folder
    #[command(alias = "dir")]
    Ls {
        /// Folder to list
        #[arg(default_value = "/")]
        path: String,

        /// Descend into sub-folders
        #[arg(short, long)]
        recursive: bool,

        /// Long format with details
        #[arg(short, long)]
        long: bool,

        /// Human-readable sizes
        #[arg(short = 'H', long)]
        human: bool,

        /// Page size (0 lists everything)
        #[arg(long, default_value_t = 0)]
        first: usize,

        /// Resume after this backend-local path
        #[arg(long)]
        after: Option<String>,
    },

    /// List folders under a folder
    Folders {
        /// Folder to list
        #[arg(default_value = "/")]
        path: String,

        /// Descend into sub-folders
        #[arg(short, long)]
        recursive: bool,
    },

    /// Display file contents
    Cat {
        /// File to display
        path: String,
    },

    /// Show file information
    Stat {
        /// File to inspect
        path: String,
    },

    /// Create or overwrite a file
    Put {
        /// Destination path
        path: String,

        /// Read contents from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Content type to record
        #[arg(short, long)]
        mime: Option<String>,
    },

    /// Remove a file
    Rm {
        /// File to remove
        path: String,
    },

    /// Create a folder (parents included)
    Mkdir {
        /// Folder to create
        path: String,
    },

    /// Remove an empty folder
    Rmdir {
        /// Folder to remove
        path: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let router = match commands::open_router(cli.config.as_deref(), cli.verbose).await {
        Ok(router) => router,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Mounts => commands::mounts(&router),
        Commands::Ls { path, recursive, long, human, first, after } => {
            commands::ls(&router, &path, recursive, long, human, first, after, cli.verbose).await
        }
        Commands::Folders { path, recursive } => {
            commands::folders(&router, &path, recursive, cli.verbose).await
        }
        Commands::Cat { path } => {
            commands::cat(&router, &path, cli.verbose).await
        }
        Commands::Stat { path } => {
            commands::stat(&router, &path, cli.verbose).await
        }
        Commands::Put { path, file, mime } => {
            commands::put(&router, &path, file.as_deref(), mime, cli.verbose).await
        }
        Commands::Rm { path } => {
            commands::rm(&router, &path, cli.verbose).await
        }
        Commands::Mkdir { path } => {
            commands::mkdir(&router, &path, cli.verbose).await
        }
        Commands::Rmdir { path } => {
            commands::rmdir(&router, &path, cli.verbose).await
        }
    };

    let closed = router.close().await;

    match result.and(closed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
