// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Stream Header and Chunk Derivations
//!
//! **Format** (all integers big-endian):
//! ```text
//! single : [type 0x53 | ephemeral pk (33) | base iv (16) | chunk size (4)]
//! multi  : [type 0x4D | ephemeral pk (33) | base iv (16) | chunk size (4) | count (2) | entries]
//! ```
//!
//! Entries use the same `id ‖ wrapped key` layout as buffer-mode headers.
//! The header has no tag of its own; its SHA-256 is folded into the AAD of
//! every chunk instead.

use crate::config::EciesConfig;
use crate::crypto::aead::IV_SIZE;
use crate::crypto::ecdh::COMPRESSED_PUBLIC_KEY_SIZE;
use crate::error::{EciesError, Result};
use crate::frame::header::{read_recipients, write_recipients, RecipientEntry, WRAPPED_KEY_SIZE};
use crate::frame::ByteReader;
use sha2::{Digest, Sha256};

/// Stream type tag: one recipient ('S')
pub const STREAM_TYPE_SINGLE: u8 = 0x53;

/// Stream type tag: many recipients ('M')
pub const STREAM_TYPE_MULTI: u8 = 0x4D;

/// Chunk flag: last chunk of the stream
pub const FLAG_FINAL: u8 = 0x01;

/// SHA-256 of the header bytes
pub type HeaderHash = [u8; 32];

/// Chunk AAD length: header hash ‖ seq ‖ flags
pub const CHUNK_AAD_SIZE: usize = 32 + 4 + 1;

const FIXED_SIZE: usize = 1 + COMPRESSED_PUBLIC_KEY_SIZE + IV_SIZE + 4;

/// Single- or multi-recipient stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Single,
    Multiple,
}

impl StreamKind {
    pub fn tag(self) -> u8 {
        match self {
            StreamKind::Single => STREAM_TYPE_SINGLE,
            StreamKind::Multiple => STREAM_TYPE_MULTI,
        }
    }
}

/// Parsed stream header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    pub ephemeral_public_key: [u8; COMPRESSED_PUBLIC_KEY_SIZE],
    pub base_iv: [u8; IV_SIZE],
    /// Plaintext bytes per non-final chunk
    pub chunk_size: u32,
    /// `Some` for multi-recipient streams
    pub recipients: Option<Vec<RecipientEntry>>,
}

impl StreamHeader {
    pub fn kind(&self) -> StreamKind {
        if self.recipients.is_some() {
            StreamKind::Multiple
        } else {
            StreamKind::Single
        }
    }

    /// Largest header this configuration can produce
    pub fn max_encoded_len(config: &EciesConfig) -> usize {
        let multiple = config.multiple();
        FIXED_SIZE
            + multiple.recipient_count_size
            + multiple.max_recipients * (multiple.recipient_id_size + WRAPPED_KEY_SIZE)
    }

    pub fn encode(&self, config: &EciesConfig) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(FIXED_SIZE);
        out.push(self.kind().tag());
        out.extend_from_slice(&self.ephemeral_public_key);
        out.extend_from_slice(&self.base_iv);
        out.extend_from_slice(&self.chunk_size.to_be_bytes());
        if let Some(recipients) = &self.recipients {
            write_recipients(recipients, config, &mut out)?;
        }
        Ok(out)
    }

    /// Parse a complete header; extra bytes are rejected
    pub fn decode(bytes: &[u8], config: &EciesConfig) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);

        let kind = match reader.u8("stream type")? {
            STREAM_TYPE_SINGLE => StreamKind::Single,
            STREAM_TYPE_MULTI => StreamKind::Multiple,
            other => return Err(EciesError::UnsupportedEncryptionType(other)),
        };
        let ephemeral_public_key = reader.take_array("ephemeral public key")?;
        let base_iv = reader.take_array("base iv")?;

        let chunk_size = reader.u32("chunk size")?;
        if chunk_size == 0 {
            return Err(EciesError::MalformedHeader("chunk size is zero".to_string()));
        }
        let max = config.stream().max_chunk_size as u64;
        if chunk_size as u64 > max {
            return Err(EciesError::LengthTooLong {
                length: chunk_size as u64,
                max,
            });
        }

        let recipients = match kind {
            StreamKind::Single => None,
            StreamKind::Multiple => Some(read_recipients(&mut reader, config)?),
        };

        if reader.remaining() != 0 {
            return Err(EciesError::MalformedHeader(format!(
                "{} unexpected bytes after stream header",
                reader.remaining()
            )));
        }

        Ok(Self {
            ephemeral_public_key,
            base_iv,
            chunk_size,
            recipients,
        })
    }
}

pub fn header_hash(header_bytes: &[u8]) -> HeaderHash {
    Sha256::digest(header_bytes).into()
}

/// IV for chunk `index`: base IV with its last 8 bytes XOR the index
pub fn chunk_iv(base_iv: &[u8; IV_SIZE], index: u32) -> [u8; IV_SIZE] {
    let mut iv = *base_iv;
    for (byte, mask) in iv[IV_SIZE - 8..].iter_mut().zip((index as u64).to_be_bytes()) {
        *byte ^= mask;
    }
    iv
}

/// AAD for chunk `seq`: header hash ‖ seq ‖ flags
pub fn chunk_aad(hash: &HeaderHash, seq: u32, flags: u8) -> [u8; CHUNK_AAD_SIZE] {
    let mut aad = [0u8; CHUNK_AAD_SIZE];
    aad[..32].copy_from_slice(hash);
    aad[32..36].copy_from_slice(&seq.to_be_bytes());
    aad[36] = flags;
    aad
}
