// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Streaming Encryption
//!
//! Encrypts and decrypts payloads of any size with a bounded working set
//! (two plaintext chunks on encrypt, one on decrypt). Key establishment runs
//! once up front, exactly as in buffer mode; each chunk is then sealed
//! independently.
//!
//! ## Layout
//!
//! ```text
//! stream header   : length-prefixed(header bytes)            (see [`header`])
//! chunk unit (xn) : [seq u32 | flags u8 | length-prefixed(ciphertext ‖ tag)]
//! ```
//!
//! ## Per-chunk Binding
//!
//! - IV: base IV with its last 8 bytes XOR the chunk index
//! - AAD: SHA-256(header bytes) ‖ seq ‖ flags
//!
//! The final chunk carries [`FLAG_FINAL`]; an empty payload still produces
//! one empty final chunk. Reordering, dropping or duplicating chunks, cutting
//! the stream short and appending bytes are all detected.
//!
//! ## Progress & Cancellation
//!
//! [`StreamOptions`] optionally carries an mpsc sender for
//! [`StreamProgress`] snapshots and a `CancellationToken` checked before
//! every chunk. Progress uses `try_send`: a full channel drops the update
//! rather than stalling the stream.

pub mod header;
pub mod progress;

pub use header::{
    chunk_aad, chunk_iv, header_hash, StreamHeader, StreamKind, FLAG_FINAL, STREAM_TYPE_MULTI,
    STREAM_TYPE_SINGLE,
};
pub use progress::{StreamProgress, THROUGHPUT_WINDOW};

use crate::config::EciesConfig;
use crate::crypto::aead::{
    aead_decrypt_in_place, aead_encrypt_in_place, generate_iv, generate_message_key, TAG_SIZE,
};
use crate::crypto::ecdh::{parse_public_key, shared_secret, EciesKeyPair};
use crate::crypto::kdf::derive_symmetric_key;
use crate::ecies::multi::{unwrap_key, validate_recipients, wrap_key};
use crate::ecies::Recipient;
use crate::error::{EciesError, Result};
use crate::frame::length::{decode_length, encode_length, LengthWidth};
use progress::ProgressTracker;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Who a stream is encrypted for
#[derive(Debug, Clone, Copy)]
pub enum StreamTarget<'a> {
    /// One recipient public key; the HKDF output is the stream key
    Single(&'a [u8]),
    /// Random stream key wrapped per recipient
    Multiple(&'a [Recipient]),
}

/// Optional knobs for one streaming operation
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    /// Receives a snapshot after every chunk
    pub progress: Option<mpsc::Sender<StreamProgress>>,
    /// Checked before every chunk
    pub cancel: Option<CancellationToken>,
    /// Expected plaintext size, for percent and ETA
    pub total_bytes: Option<u64>,
    /// Encrypt only: overrides the configured chunk size
    pub chunk_size: Option<usize>,
    /// Decrypt only: hold plaintext in memory and write it once the final
    /// chunk verifies, so a failed stream leaves the sink untouched
    pub withhold_until_verified: bool,
}

impl StreamOptions {
    pub fn with_progress(mut self, sender: mpsc::Sender<StreamProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_total_bytes(mut self, total: u64) -> Self {
        self.total_bytes = Some(total);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn withhold_output(mut self) -> Self {
        self.withhold_until_verified = true;
        self
    }

    fn check_cancelled(&self, chunk: u32) -> Result<()> {
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                warn!(chunk, "⚠️  Stream cancelled");
                return Err(EciesError::Cancelled);
            }
        }
        Ok(())
    }

    fn report(&self, progress: StreamProgress) {
        if let Some(sender) = &self.progress {
            let _ = sender.try_send(progress);
        }
    }
}

/// Outcome of a completed stream
///
/// Only returned on success. A failed decrypt may already have written the
/// chunks that verified before the failure unless
/// [`StreamOptions::withhold_until_verified`] was set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub kind: StreamKind,
    pub chunks: u64,
    /// Plaintext bytes read (encrypt) or written (decrypt)
    pub plaintext_bytes: u64,
}

fn resolve_chunk_size(config: &EciesConfig, requested: Option<usize>) -> Result<usize> {
    let chunk_size = requested.unwrap_or(config.stream().chunk_size);
    if chunk_size == 0 {
        return Err(EciesError::InvalidOverride(
            "chunk size must be at least 1 byte".to_string(),
        ));
    }
    let max = config.stream().max_chunk_size;
    if chunk_size > max {
        return Err(EciesError::LengthTooLong {
            length: chunk_size as u64,
            max: max as u64,
        });
    }
    Ok(chunk_size)
}

/// Read until `limit` bytes or EOF
async fn read_up_to<R: AsyncRead + Unpin>(reader: &mut R, limit: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(limit);
    (&mut *reader).take(limit as u64).read_to_end(&mut buf).await?;
    Ok(buf)
}

/// Fill `buf` from `reader`, returning how many bytes arrived before EOF
async fn read_fully<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

async fn read_exact_or_truncated<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
    what: &str,
) -> Result<()> {
    let filled = read_fully(reader, buf).await?;
    if filled < buf.len() {
        return Err(EciesError::StreamTruncated(format!(
            "{} declares {} bytes, only {} available",
            what,
            buf.len(),
            filled
        )));
    }
    Ok(())
}

/// Read a length prefix (tag + BE value) from the stream
async fn read_length<R: AsyncRead + Unpin>(reader: &mut R, what: &str) -> Result<u64> {
    let mut field = [0u8; 9];
    if read_fully(reader, &mut field[..1]).await? == 0 {
        return Err(EciesError::StreamTruncated(format!("missing {} length", what)));
    }
    let width = LengthWidth::from_tag(field[0])?;
    let end = 1 + width.size();
    if read_fully(reader, &mut field[1..end]).await? < width.size() {
        return Err(EciesError::StreamTruncated(format!("{} length cut short", what)));
    }
    decode_length(&field[..end]).map(|(length, _)| length)
}

async fn write_unit<W: AsyncWrite + Unpin>(
    writer: &mut W,
    seq: u32,
    flags: u8,
    sealed: &[u8],
) -> Result<()> {
    let mut prefix = Vec::with_capacity(5 + 9);
    prefix.extend_from_slice(&seq.to_be_bytes());
    prefix.push(flags);
    encode_length(sealed.len() as u64, &mut prefix)?;
    writer.write_all(&prefix).await?;
    writer.write_all(sealed).await?;
    Ok(())
}

/// Encrypt everything `reader` yields into `writer`
pub async fn encrypt_stream<R, W>(
    config: &EciesConfig,
    target: StreamTarget<'_>,
    reader: &mut R,
    writer: &mut W,
    options: StreamOptions,
) -> Result<StreamSummary>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let chunk_size = resolve_chunk_size(config, options.chunk_size)?;

    // 1. Establish the stream key
    let ephemeral = EciesKeyPair::generate();
    let (stream_key, recipients) = match target {
        StreamTarget::Single(public_key) => {
            let peer = parse_public_key(public_key)?;
            let secret = shared_secret(ephemeral.secret_key(), &peer);
            (derive_symmetric_key(secret.as_ref(), config)?, None)
        }
        StreamTarget::Multiple(list) => {
            validate_recipients(config, list)?;
            let message_key = generate_message_key();
            let entries = list
                .iter()
                .map(|recipient| wrap_key(config, &ephemeral, recipient, &message_key))
                .collect::<Result<Vec<_>>>()?;
            (Zeroizing::new(message_key.to_vec()), Some(entries))
        }
    };

    // 2. Header
    let header = StreamHeader {
        ephemeral_public_key: ephemeral.public_key_compressed(),
        base_iv: generate_iv(),
        chunk_size: chunk_size as u32,
        recipients,
    };
    let header_bytes = header.encode(config)?;
    let hash = header_hash(&header_bytes);

    let mut prefix = Vec::with_capacity(9);
    encode_length(header_bytes.len() as u64, &mut prefix)?;
    writer.write_all(&prefix).await?;
    writer.write_all(&header_bytes).await?;

    debug!(
        kind = ?header.kind(),
        chunk_size,
        recipients = header.recipients.as_ref().map_or(1, |r| r.len()),
        "Stream header written"
    );

    // 3. Chunks, reading one ahead to spot the final one
    let mut tracker = ProgressTracker::new(options.total_bytes);
    let mut index: u32 = 0;
    let mut current = read_up_to(reader, chunk_size).await?;
    loop {
        options.check_cancelled(index)?;

        let next = if current.len() == chunk_size {
            read_up_to(reader, chunk_size).await?
        } else {
            Vec::new()
        };
        let is_final = next.is_empty();
        let flags = if is_final { FLAG_FINAL } else { 0 };
        let plain_len = current.len();

        let iv = chunk_iv(&header.base_iv, index);
        let aad = chunk_aad(&hash, index, flags);
        let tag = aead_encrypt_in_place(&stream_key, &iv, &aad, &mut current)?;
        current.extend_from_slice(&tag);
        write_unit(writer, index, flags, &current).await?;

        options.report(tracker.record(plain_len as u64));
        debug!(chunk = index, bytes = plain_len, is_final, "Encrypted chunk");

        if is_final {
            break;
        }
        index = index.checked_add(1).ok_or(EciesError::LengthTooLong {
            length: u32::MAX as u64 + 1,
            max: u32::MAX as u64,
        })?;
        current = next;
    }
    writer.flush().await?;

    info!(
        kind = ?header.kind(),
        chunks = tracker.chunks(),
        bytes = tracker.bytes(),
        "✅ Stream encrypted"
    );
    Ok(StreamSummary {
        kind: header.kind(),
        chunks: tracker.chunks(),
        plaintext_bytes: tracker.bytes(),
    })
}

/// Decrypt a stream, writing each chunk only after its tag verifies
///
/// By default plaintext is released chunk by chunk, so an error part way
/// through leaves the verified prefix in `writer`. With
/// [`StreamOptions::withhold_until_verified`] nothing is written until the
/// whole stream, including the trailing-data check, has verified.
pub async fn decrypt_stream<R, W>(
    config: &EciesConfig,
    key_pair: &EciesKeyPair,
    recipient_id: Option<&[u8]>,
    reader: &mut R,
    writer: &mut W,
    options: StreamOptions,
) -> Result<StreamSummary>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    // 1. Header
    let header_len = read_length(reader, "stream header").await?;
    let max_header = StreamHeader::max_encoded_len(config) as u64;
    if header_len > max_header {
        return Err(EciesError::LengthTooLong {
            length: header_len,
            max: max_header,
        });
    }
    let mut header_bytes = vec![0u8; header_len as usize];
    read_exact_or_truncated(reader, &mut header_bytes, "stream header").await?;
    let header = StreamHeader::decode(&header_bytes, config)?;
    let hash = header_hash(&header_bytes);

    // 2. Recover the stream key
    let stream_key = match &header.recipients {
        None => {
            let secret = key_pair
                .diffie_hellman(&header.ephemeral_public_key)
                .map_err(|_| EciesError::DecryptionFailed)?;
            derive_symmetric_key(secret.as_ref(), config)?
        }
        Some(entries) => {
            let id = recipient_id.ok_or_else(|| {
                EciesError::InvalidIdentifier(
                    "recipient id required for multi-recipient streams".to_string(),
                )
            })?;
            let entry = entries
                .iter()
                .find(|entry| entry.id == id)
                .ok_or(EciesError::RecipientNotFound)?;
            let key = unwrap_key(config, key_pair, &header.ephemeral_public_key, entry)?;
            Zeroizing::new(key.to_vec())
        }
    };

    // 3. Chunks
    let max_unit = header.chunk_size as u64 + TAG_SIZE as u64;
    let mut tracker = ProgressTracker::new(options.total_bytes);
    let mut withheld = options.withhold_until_verified.then(|| Zeroizing::new(Vec::new()));
    let mut expected: u32 = 0;
    loop {
        options.check_cancelled(expected)?;

        let mut seq_bytes = [0u8; 4];
        match read_fully(reader, &mut seq_bytes).await? {
            0 => {
                warn!(chunks = expected, "❌ Stream ended before final chunk");
                return Err(EciesError::StreamTruncated(format!(
                    "stream ended after {} chunks without a final chunk",
                    expected
                )));
            }
            4 => {}
            _ => {
                return Err(EciesError::StreamTruncated(format!(
                    "chunk {} sequence number cut short",
                    expected
                )));
            }
        }
        let seq = u32::from_be_bytes(seq_bytes);
        if seq != expected {
            warn!(expected, actual = seq, "❌ Chunk out of sequence");
            return Err(EciesError::ChunkOutOfSequence {
                expected,
                actual: seq,
            });
        }

        let mut flags = [0u8; 1];
        if read_fully(reader, &mut flags).await? == 0 {
            return Err(EciesError::StreamTruncated(format!(
                "chunk {} flags missing",
                seq
            )));
        }
        let flags = flags[0];
        if flags & !FLAG_FINAL != 0 {
            return Err(EciesError::MalformedHeader(format!(
                "chunk {} has unknown flags {:#04x}",
                seq, flags
            )));
        }

        let unit_len = read_length(reader, "chunk").await?;
        if unit_len > max_unit {
            return Err(EciesError::LengthTooLong {
                length: unit_len,
                max: max_unit,
            });
        }
        if unit_len < TAG_SIZE as u64 {
            return Err(EciesError::StreamTruncated(format!(
                "chunk {} is shorter than its auth tag",
                seq
            )));
        }

        let mut unit = vec![0u8; unit_len as usize];
        read_exact_or_truncated(reader, &mut unit, &format!("chunk {}", seq)).await?;
        let tag = unit.split_off(unit.len() - TAG_SIZE);

        let iv = chunk_iv(&header.base_iv, seq);
        let aad = chunk_aad(&hash, seq, flags);
        aead_decrypt_in_place(&stream_key, &iv, &aad, &mut unit, &tag)?;
        match withheld.as_mut() {
            Some(held) => held.extend_from_slice(&unit),
            None => writer.write_all(&unit).await?,
        }

        options.report(tracker.record(unit.len() as u64));
        debug!(chunk = seq, bytes = unit.len(), "Decrypted chunk");

        if flags & FLAG_FINAL != 0 {
            let mut probe = [0u8; 1];
            if read_fully(reader, &mut probe).await? != 0 {
                warn!(chunks = tracker.chunks(), "❌ Data after final chunk");
                return Err(EciesError::TrailingData);
            }
            break;
        }
        expected = expected.checked_add(1).ok_or(EciesError::LengthTooLong {
            length: u32::MAX as u64 + 1,
            max: u32::MAX as u64,
        })?;
    }
    if let Some(held) = &withheld {
        writer.write_all(held).await?;
    }
    writer.flush().await?;

    info!(
        kind = ?header.kind(),
        chunks = tracker.chunks(),
        bytes = tracker.bytes(),
        "✅ Stream decrypted"
    );
    Ok(StreamSummary {
        kind: header.kind(),
        chunks: tracker.chunks(),
        plaintext_bytes: tracker.bytes(),
    })
}
