// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::keys::{parse_private_key, parse_public_key};
use crate::ecies::{Ecies, Recipient};
use crate::frame::EncryptionMode;
use crate::identifiers::IdentifierProvider;
use crate::streaming::{StreamOptions, StreamProgress};

/// Arguments for encrypt command
#[derive(Args, Debug)]
pub struct EncryptArgs {
    /// Recipient public key as hex (repeat for multiple recipients)
    #[arg(long = "recipient", required = true)]
    pub recipients: Vec<String>,

    /// Recipient ID in the provider's text form, one per --recipient (multiple mode)
    #[arg(long = "recipient-id")]
    pub recipient_ids: Vec<String>,

    /// Envelope mode (simple/single/multiple)
    #[arg(long, default_value = "simple")]
    pub mode: EncryptionMode,

    /// Use the chunked streaming format
    #[arg(long)]
    pub stream: bool,

    /// Plaintext bytes per chunk (streaming only)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Plaintext input file
    #[arg(long)]
    pub input: PathBuf,

    /// Ciphertext output file
    #[arg(long)]
    pub output: PathBuf,
}

/// Arguments for decrypt command
#[derive(Args, Debug)]
pub struct DecryptArgs {
    /// Private key as hex (can also be set via FABSTIR_ECIES_PRIVATE_KEY env var)
    #[arg(long, env = "FABSTIR_ECIES_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// Own recipient ID in the provider's text form (multiple mode)
    #[arg(long)]
    pub recipient_id: Option<String>,

    /// Input uses the chunked streaming format
    #[arg(long)]
    pub stream: bool,

    /// Ciphertext input file
    #[arg(long)]
    pub input: PathBuf,

    /// Plaintext output file
    #[arg(long)]
    pub output: PathBuf,
}

/// Pair public keys with IDs; single-recipient modes get a placeholder ID
fn build_recipients(ecies: &Ecies, args: &EncryptArgs) -> Result<Vec<Recipient>> {
    let provider = ecies.config().id_provider();

    if args.mode == EncryptionMode::Multiple && args.recipient_ids.len() != args.recipients.len() {
        return Err(anyhow!(
            "Multiple mode needs one --recipient-id per --recipient ({} ids for {} keys)",
            args.recipient_ids.len(),
            args.recipients.len()
        ));
    }

    args.recipients
        .iter()
        .enumerate()
        .map(|(i, key)| {
            let public_key = parse_public_key(key)?;
            let id = match args.recipient_ids.get(i) {
                Some(text) => provider.id_from_string(text)?,
                None => vec![0u8; provider.byte_length()],
            };
            Ok(Recipient::new(id, public_key))
        })
        .collect()
}

fn progress_channel(label: &'static str) -> mpsc::Sender<StreamProgress> {
    let (tx, mut rx) = mpsc::channel::<StreamProgress>(32);
    tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            info!(
                op = label,
                chunks = progress.chunks_processed,
                bytes = progress.bytes_processed,
                percent = ?progress.percent.map(|p| (p * 10.0).round() / 10.0),
                eta_secs = ?progress.eta.map(|d| d.as_secs()),
                "📊 Progress"
            );
        }
    });
    tx
}

/// Cancel the stream on Ctrl-C
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️  Interrupt received, cancelling after current chunk");
            child.cancel();
        }
    });
    token
}

async fn file_size(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path).await.ok().map(|m| m.len())
}

/// Encrypt a file
pub async fn encrypt(ecies: &Ecies, args: EncryptArgs) -> Result<()> {
    let recipients = build_recipients(ecies, &args)?;

    if args.stream {
        let mut options = StreamOptions::default()
            .with_progress(progress_channel("encrypt"))
            .with_cancellation(ctrl_c_token());
        if let Some(total) = file_size(&args.input).await {
            options = options.with_total_bytes(total);
        }
        if let Some(chunk_size) = args.chunk_size {
            options = options.with_chunk_size(chunk_size);
        }

        let input = File::open(&args.input)
            .await
            .with_context(|| format!("Failed to open {}", args.input.display()))?;
        let output = File::create(&args.output)
            .await
            .with_context(|| format!("Failed to create {}", args.output.display()))?;
        let mut reader = BufReader::new(input);
        let mut writer = BufWriter::new(output);

        let result = ecies
            .encrypt_stream(args.mode, &recipients, &mut reader, &mut writer, options)
            .await;

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                // An unterminated stream never decrypts
                discard_output(writer, &args.output).await;
                return Err(e.into());
            }
        };
        println!(
            "✅ Encrypted {} bytes in {} chunks → {}",
            summary.plaintext_bytes,
            summary.chunks,
            args.output.display()
        );
        return Ok(());
    }

    let plaintext = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let envelope = ecies.encrypt(args.mode, &recipients, &plaintext)?;
    tokio::fs::write(&args.output, &envelope)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "✅ Encrypted {} bytes ({} mode, {} recipient(s)) → {} ({} bytes)",
        plaintext.len(),
        args.mode,
        recipients.len(),
        args.output.display(),
        envelope.len()
    );
    Ok(())
}

/// Close and delete the output of a failed stream
async fn discard_output(writer: BufWriter<File>, path: &Path) {
    drop(writer);
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("⚠️  Failed to remove partial output {}: {}", path.display(), e);
    }
}

/// Decrypt a file
pub async fn decrypt(ecies: &Ecies, args: DecryptArgs) -> Result<()> {
    let private_key = parse_private_key(&args.private_key)?;
    let recipient_id = args
        .recipient_id
        .as_deref()
        .map(|text| ecies.config().id_provider().id_from_string(text))
        .transpose()?;

    if args.stream {
        let options = StreamOptions::default()
            .with_progress(progress_channel("decrypt"))
            .with_cancellation(ctrl_c_token());

        let input = File::open(&args.input)
            .await
            .with_context(|| format!("Failed to open {}", args.input.display()))?;
        let output = File::create(&args.output)
            .await
            .with_context(|| format!("Failed to create {}", args.output.display()))?;
        let mut reader = BufReader::new(input);
        let mut writer = BufWriter::new(output);

        let key = private_key.expose()?;
        let result = ecies
            .decrypt_stream(
                &key,
                recipient_id.as_deref(),
                &mut reader,
                &mut writer,
                options,
            )
            .await;

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                // Never leave a partially verified plaintext behind
                discard_output(writer, &args.output).await;
                return Err(e.into());
            }
        };
        println!(
            "✅ Decrypted {} bytes in {} chunks → {}",
            summary.plaintext_bytes,
            summary.chunks,
            args.output.display()
        );
        return Ok(());
    }

    let envelope = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let plaintext = private_key
        .with_value(|key| ecies.decrypt(key, recipient_id.as_deref(), &envelope))??;
    tokio::fs::write(&args.output, &plaintext)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "✅ Decrypted {} bytes → {}",
        plaintext.len(),
        args.output.display()
    );
    Ok(())
}
