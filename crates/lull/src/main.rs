// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lull - collects quiet-bounded Discord conversations and summarizes them.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Lull - collects quiet-bounded Discord conversations and summarizes them.
#[derive(Parser, Debug)]
#[command(name = "lull", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default lookup paths.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to Discord and collect conversations until interrupted.
    Serve,
    /// Show persisted checkpoints and the tracked channel set.
    Status {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => lull_config::load_and_validate_path(path),
        None => lull_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            lull_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        None => {
            println!("lull: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    #[serial_test::serial]
    fn binary_loads_config_defaults() {
        let config = lull_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.window.min_cluster, 5);
    }

    #[test]
    fn status_flags_parse() {
        let cli = Cli::try_parse_from(["lull", "--config", "x.toml", "status", "--json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Status { json: true, plain: false })
        ));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["lull", "summarize"]).is_err());
    }
}
