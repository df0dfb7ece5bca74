// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use vnfm_core::application::userdata::UserDataRegistry;
use vnfm_core::domain::engine_config::EngineConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a configuration file with default values
    Generate {
        /// Output path (default: ./vnfm-config.yaml)
        #[arg(short, long, default_value = "./vnfm-config.yaml")]
        output: PathBuf,
    },
}

pub fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output } => generate(output),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = EngineConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. VNFM_CONFIG_PATH: {}",
            std::env::var("VNFM_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./vnfm-config.yaml");
        println!("  4. ~/.vnfm/config.yaml");
        println!("  5. /etc/vnfm/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Engine:".bold());
    println!("  Name: {}", config.metadata.name);
    if let Some(version) = &config.metadata.version {
        println!("  Version: {}", version);
    }
    println!("  CSAR root: {}", config.spec.csar_root.display());
    println!(
        "  Stack create timeout: {} min",
        config.spec.stack_create_timeout_mins
    );
    println!("  Log level: {}", config.spec.logging.level);
    println!();

    println!("{}", "Userdata:".bold());
    let registry = UserDataRegistry::from_config(&config.spec);
    for class in registry.classes() {
        if class == config.spec.default_userdata {
            println!("  {} {}", class.bold(), "(default)".dimmed());
        } else {
            println!("  {}", class);
        }
    }
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = EngineConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: PathBuf) -> Result<()> {
    EngineConfigManifest::default()
        .to_yaml_file(&output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
