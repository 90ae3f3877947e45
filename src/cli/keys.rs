// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Args;

use crate::crypto::{EciesKeyPair, SecureBuffer};

/// Arguments for keygen command
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Print as JSON instead of labelled lines
    #[arg(long)]
    pub json: bool,

    /// Also print the 65-byte uncompressed public key
    #[arg(long)]
    pub uncompressed: bool,
}

/// Generate and print a key pair
pub fn keygen(args: KeygenArgs) -> Result<()> {
    let pair = EciesKeyPair::generate();
    let private_hex = hex::encode(pair.private_key_bytes().as_ref());
    let public_hex = hex::encode(pair.public_key_compressed());
    let uncompressed_hex = args
        .uncompressed
        .then(|| hex::encode(pair.public_key_uncompressed()));

    if args.json {
        let mut out = serde_json::json!({
            "private_key": private_hex,
            "public_key": public_hex,
        });
        if let Some(uncompressed) = uncompressed_hex {
            out["public_key_uncompressed"] = serde_json::Value::String(uncompressed);
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("🔑 Private key: {}", private_hex);
        println!("📢 Public key:  {}", public_hex);
        if let Some(uncompressed) = uncompressed_hex {
            println!("   Uncompressed: {}", uncompressed);
        }
    }
    Ok(())
}

/// Decode a hex private key into a masked buffer
///
/// Accepts an optional `0x` prefix.
pub fn parse_private_key(text: &str) -> Result<SecureBuffer> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|e| anyhow!("Private key is not valid hex: {}", e))?;
    if bytes.len() != 32 {
        return Err(anyhow!(
            "Invalid private key size: expected 32 bytes, got {}",
            bytes.len()
        ));
    }
    Ok(SecureBuffer::new(bytes))
}

/// Decode a hex public key (33, 64 or 65 bytes)
pub fn parse_public_key(text: &str) -> Result<Vec<u8>> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|e| anyhow!("Public key is not valid hex: {}", e))?;
    crate::crypto::normalize_public_key(&bytes)?;
    Ok(bytes)
}
