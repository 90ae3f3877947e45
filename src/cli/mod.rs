// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod envelope;
pub mod info;
pub mod keys;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::EciesConfig;
use crate::ecies::Ecies;

/// Fabstir ECIES CLI
#[derive(Parser, Debug)]
#[command(name = "fabstir-ecies")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Encrypt and decrypt ECIES envelopes (secp256k1 + AES-256-GCM)", long_about = None)]
pub struct Cli {
    /// JSON file with configuration overrides
    #[arg(long, global = true, env = "FABSTIR_ECIES_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a secp256k1 key pair
    Keygen(keys::KeygenArgs),

    /// Encrypt a file for one or more recipients
    Encrypt(envelope::EncryptArgs),

    /// Decrypt a file
    Decrypt(envelope::DecryptArgs),

    /// Recipient identifier tools
    Id(info::IdArgs),

    /// Configuration tools
    Config(info::ConfigArgs),

    /// Show version and wire-format information
    Version,
}

/// Load the effective configuration (default + optional override file)
pub async fn load_config(path: Option<&PathBuf>) -> Result<EciesConfig> {
    let Some(path) = path else {
        return Ok(EciesConfig::default());
    };

    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let overrides: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Config file {} is not valid JSON", path.display()))?;
    let config = EciesConfig::build(Some(&overrides))?;

    info!(path = %path.display(), "🔧 Loaded configuration overrides");
    Ok(config)
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref()).await?;
    let ecies = Ecies::new(Arc::new(config));

    match cli.command {
        Commands::Keygen(args) => keys::keygen(args),
        Commands::Encrypt(args) => envelope::encrypt(&ecies, args).await,
        Commands::Decrypt(args) => envelope::decrypt(&ecies, args).await,
        Commands::Id(args) => info::id(&ecies, args),
        Commands::Config(args) => info::config(&ecies, args),
        Commands::Version => info::version(),
    }
}
