// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::{Args, Subcommand};

use crate::ecies::Ecies;
use crate::identifiers::IdentifierProvider;

/// Arguments for id command
#[derive(Args, Debug)]
pub struct IdArgs {
    #[command(subcommand)]
    pub command: IdCommand,
}

#[derive(Subcommand, Debug)]
pub enum IdCommand {
    /// Generate fresh recipient IDs with the configured provider
    Generate {
        /// How many IDs to print
        #[arg(long, default_value_t = 1)]
        count: usize,
    },

    /// Check that an ID parses and has the configured width
    Check {
        /// ID in the provider's text form
        id: String,
    },
}

/// Arguments for config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as JSON
    Show,

    /// Print per-mode envelope overhead
    Overhead {
        /// Recipient count used for the multiple-mode figure
        #[arg(long, default_value_t = 1)]
        recipients: usize,
    },
}

/// Handle id subcommands
pub fn id(ecies: &Ecies, args: IdArgs) -> Result<()> {
    let provider = ecies.config().id_provider();
    match args.command {
        IdCommand::Generate { count } => {
            for _ in 0..count {
                println!("{}", provider.id_to_string(&provider.generate())?);
            }
        }
        IdCommand::Check { id } => {
            let bytes = provider.id_from_string(&id)?;
            println!(
                "✅ Valid {} id ({} bytes): {}",
                provider.name(),
                bytes.len(),
                hex::encode(&bytes)
            );
        }
    }
    Ok(())
}

/// Handle config subcommands
pub fn config(ecies: &Ecies, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Show => {
            println!("{}", serde_json::to_string_pretty(ecies.config())?);
        }
        ConfigCommand::Overhead { recipients } => {
            use crate::frame::EncryptionMode;
            for mode in [
                EncryptionMode::Simple,
                EncryptionMode::Single,
                EncryptionMode::Multiple,
            ] {
                let count = if mode == EncryptionMode::Multiple { recipients } else { 1 };
                let overhead = ecies.compute_encrypted_length(mode, 0, count)?;
                println!("{:<8} {} bytes", mode.name(), overhead);
            }
        }
    }
    Ok(())
}

/// Print version information
pub fn version() -> Result<()> {
    println!("{}", crate::version::get_version_string());
    println!(
        "{}",
        serde_json::to_string_pretty(&crate::version::get_version_info())?
    );
    Ok(())
}
