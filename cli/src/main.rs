// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # VNFM Template Rendering CLI
//!
//! The `vnfm` binary renders the stack fields a VNF manager hands to the
//! infrastructure backend for one lifecycle operation.
//!
//! ## Commands
//!
//! - `vnfm render` - Render forward or rollback stack fields from JSON snapshots
//! - `vnfm config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vnfm_core::domain::engine_config::{EngineConfigManifest, LoggingConfig};

mod commands;

use commands::{ConfigCommand, RenderArgs};

/// VNFM - Template parameterization for VNF lifecycle management
#[derive(Parser)]
#[command(name = "vnfm")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "VNFM_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error) [default: spec.logging.level]
    #[arg(long, global = true, env = "VNFM_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render stack fields for a lifecycle operation
    #[command(name = "render")]
    Render(RenderArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = log_level(cli.log_level.clone(), cli.config.clone());
    init_logging(&level)?;

    match cli.command {
        Commands::Render(args) => commands::render::execute(args, cli.config),
        Commands::Config { command } => commands::config::handle_command(command, cli.config),
    }
}

/// Log level from the flag, else from the configuration file.
///
/// A configuration that fails to load falls back to the default level; the
/// command itself reports the load error.
fn log_level(cli_level: Option<String>, config_path: Option<PathBuf>) -> String {
    cli_level.unwrap_or_else(|| {
        EngineConfigManifest::load_or_default(config_path)
            .map(|config| config.spec.logging.level)
            .unwrap_or_else(|_| LoggingConfig::default().level)
    })
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    // stdout carries the rendered JSON
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
