// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Message Headers
//!
//! **Format** (all integers big-endian):
//! ```text
//! simple   : [type 33 | ephemeral pk (33) | iv (16) | tag (16)]
//! single   : [type 66 | ephemeral pk (33) | iv (16) | tag (16) | plaintext length (8)]
//! multiple : [type 99 | ephemeral pk (33) | iv (16) | tag (16) | count (2) | entries]
//! entry    : [recipient id (id size) | wrapped key (129)]
//! wrapped  : [ephemeral pk uncompressed (65) | iv (16) | tag (16) | encrypted key (32)]
//! ```
//!
//! The ciphertext follows the header directly.
//!
//! ## Additional Authenticated Data
//!
//! The payload tag cannot authenticate itself, so the payload AAD is the
//! header with the tag field left out: type ‖ ephemeral pk ‖ iv ‖ [length] ‖
//! [count ‖ entries]. Every other header byte, including each wrapped key,
//! is covered.

use super::ByteReader;
use crate::config::EciesConfig;
use crate::crypto::aead::{IV_SIZE, KEY_SIZE, TAG_SIZE};
use crate::crypto::ecdh::{COMPRESSED_PUBLIC_KEY_SIZE, UNCOMPRESSED_PUBLIC_KEY_SIZE};
use crate::error::{EciesError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Type tag: one recipient, no length field
pub const TYPE_SIMPLE: u8 = 33;

/// Type tag: one recipient, explicit plaintext length
pub const TYPE_SINGLE: u8 = 66;

/// Type tag: many recipients, wrapped message key
pub const TYPE_MULTIPLE: u8 = 99;

/// Size of one wrapped message key block
pub const WRAPPED_KEY_SIZE: usize = UNCOMPRESSED_PUBLIC_KEY_SIZE + IV_SIZE + TAG_SIZE + KEY_SIZE;

/// Size of the plaintext length field in single mode
pub const DATA_LENGTH_SIZE: usize = 8;

/// Size of the recipient count field in multiple mode
pub const RECIPIENT_COUNT_SIZE: usize = 2;

/// Envelope mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionMode {
    Simple,
    Single,
    Multiple,
}

impl EncryptionMode {
    pub fn tag(self) -> u8 {
        match self {
            EncryptionMode::Simple => TYPE_SIMPLE,
            EncryptionMode::Single => TYPE_SINGLE,
            EncryptionMode::Multiple => TYPE_MULTIPLE,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            TYPE_SIMPLE => Ok(EncryptionMode::Simple),
            TYPE_SINGLE => Ok(EncryptionMode::Single),
            TYPE_MULTIPLE => Ok(EncryptionMode::Multiple),
            other => Err(EciesError::UnsupportedEncryptionType(other)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EncryptionMode::Simple => "simple",
            EncryptionMode::Single => "single",
            EncryptionMode::Multiple => "multiple",
        }
    }

    /// Fixed header overhead from the configuration (multiple excludes entries)
    pub fn fixed_overhead(self, config: &EciesConfig) -> usize {
        match self {
            EncryptionMode::Simple => config.simple().fixed_overhead_size,
            EncryptionMode::Single => config.single().fixed_overhead_size,
            EncryptionMode::Multiple => config.multiple().fixed_overhead_size,
        }
    }
}

impl fmt::Display for EncryptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EncryptionMode {
    type Err = EciesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(EncryptionMode::Simple),
            "single" => Ok(EncryptionMode::Single),
            "multiple" | "multi" => Ok(EncryptionMode::Multiple),
            _ => Err(EciesError::MalformedHeader(format!(
                "unknown encryption mode '{}'",
                s
            ))),
        }
    }
}

/// Message key wrapped for one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKey {
    /// Uncompressed copy of the message's ephemeral key
    pub ephemeral_public_key: [u8; UNCOMPRESSED_PUBLIC_KEY_SIZE],
    pub iv: [u8; IV_SIZE],
    pub tag: [u8; TAG_SIZE],
    pub encrypted_key: [u8; KEY_SIZE],
}

impl WrappedKey {
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.ephemeral_public_key);
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&self.encrypted_key);
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            ephemeral_public_key: reader.take_array("wrapped key ephemeral public key")?,
            iv: reader.take_array("wrapped key iv")?,
            tag: reader.take_array("wrapped key tag")?,
            encrypted_key: reader.take_array("wrapped key ciphertext")?,
        })
    }
}

/// One addressed recipient in a multi-recipient header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientEntry {
    pub id: Vec<u8>,
    pub wrapped_key: WrappedKey,
}

/// Mode-specific header fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderBody {
    Simple,
    Single { data_length: u64 },
    Multiple { recipients: Vec<RecipientEntry> },
}

/// Parsed message header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub ephemeral_public_key: [u8; COMPRESSED_PUBLIC_KEY_SIZE],
    pub iv: [u8; IV_SIZE],
    pub auth_tag: [u8; TAG_SIZE],
    pub body: HeaderBody,
}

impl MessageHeader {
    pub fn mode(&self) -> EncryptionMode {
        match self.body {
            HeaderBody::Simple => EncryptionMode::Simple,
            HeaderBody::Single { .. } => EncryptionMode::Single,
            HeaderBody::Multiple { .. } => EncryptionMode::Multiple,
        }
    }

    pub fn recipients(&self) -> &[RecipientEntry] {
        match &self.body {
            HeaderBody::Multiple { recipients } => recipients,
            _ => &[],
        }
    }

    /// Entry addressed to `id` (linear scan)
    pub fn find_recipient(&self, id: &[u8]) -> Option<&RecipientEntry> {
        self.recipients().iter().find(|entry| entry.id == id)
    }

    /// Encoded header length for this configuration
    pub fn encoded_len(&self, config: &EciesConfig) -> usize {
        match &self.body {
            HeaderBody::Simple => config.simple().fixed_overhead_size,
            HeaderBody::Single { .. } => config.single().fixed_overhead_size,
            HeaderBody::Multiple { recipients } => {
                config.multiple().fixed_overhead_size
                    + recipients.len()
                        * (config.multiple().recipient_id_size + WRAPPED_KEY_SIZE)
            }
        }
    }

    /// Serialised header, auth tag included
    pub fn encode(&self, config: &EciesConfig) -> Result<Vec<u8>> {
        self.write(config, true)
    }

    /// Serialised header without the auth tag field (payload AAD)
    pub fn aad_bytes(&self, config: &EciesConfig) -> Result<Vec<u8>> {
        self.write(config, false)
    }

    fn write(&self, config: &EciesConfig, include_tag: bool) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len(config));
        out.push(self.mode().tag());
        out.extend_from_slice(&self.ephemeral_public_key);
        out.extend_from_slice(&self.iv);
        if include_tag {
            out.extend_from_slice(&self.auth_tag);
        }

        match &self.body {
            HeaderBody::Simple => {}
            HeaderBody::Single { data_length } => {
                out.extend_from_slice(&data_length.to_be_bytes());
            }
            HeaderBody::Multiple { recipients } => {
                write_recipients(recipients, config, &mut out)?;
            }
        }
        Ok(out)
    }

    /// Parse a header from the front of `input`
    ///
    /// Returns the header and the number of bytes it occupied; the rest of
    /// `input` is ciphertext.
    pub fn decode(input: &[u8], config: &EciesConfig) -> Result<(Self, usize)> {
        let mut reader = ByteReader::new(input);

        let mode = EncryptionMode::from_tag(reader.u8("type tag")?)?;
        let ephemeral_public_key = reader.take_array("ephemeral public key")?;
        let iv = reader.take_array("iv")?;
        let auth_tag = reader.take_array("auth tag")?;

        let body = match mode {
            EncryptionMode::Simple => HeaderBody::Simple,
            EncryptionMode::Single => HeaderBody::Single {
                data_length: reader.u64("data length")?,
            },
            EncryptionMode::Multiple => HeaderBody::Multiple {
                recipients: read_recipients(&mut reader, config)?,
            },
        };

        let header = Self {
            ephemeral_public_key,
            iv,
            auth_tag,
            body,
        };
        Ok((header, reader.position()))
    }
}

/// count (u16) ‖ entries, validating count, ID widths and uniqueness
pub(crate) fn write_recipients(
    recipients: &[RecipientEntry],
    config: &EciesConfig,
    out: &mut Vec<u8>,
) -> Result<()> {
    let id_size = config.multiple().recipient_id_size;
    check_count(recipients.len(), config)?;
    ensure_unique(recipients.iter().map(|r| r.id.as_slice()))?;

    out.extend_from_slice(&(recipients.len() as u16).to_be_bytes());
    for entry in recipients {
        if entry.id.len() != id_size {
            return Err(EciesError::InvalidIdentifier(format!(
                "recipient id must be {} bytes, got {}",
                id_size,
                entry.id.len()
            )));
        }
        out.extend_from_slice(&entry.id);
        entry.wrapped_key.encode_into(out);
    }
    Ok(())
}

pub(crate) fn read_recipients(
    reader: &mut ByteReader<'_>,
    config: &EciesConfig,
) -> Result<Vec<RecipientEntry>> {
    let count = reader.u16("recipient count")? as usize;
    if count == 0 {
        return Err(EciesError::MalformedHeader(
            "recipient count is zero".to_string(),
        ));
    }
    let max = config.multiple().max_recipients;
    if count > max {
        return Err(EciesError::MalformedHeader(format!(
            "recipient count {} exceeds maximum {}",
            count, max
        )));
    }

    let id_size = config.multiple().recipient_id_size;
    let entry_size = id_size + WRAPPED_KEY_SIZE;
    if reader.remaining() < count * entry_size {
        return Err(EciesError::MalformedHeader(format!(
            "truncated recipient table: {} entries need {} bytes, {} remain",
            count,
            count * entry_size,
            reader.remaining()
        )));
    }

    let mut recipients = Vec::with_capacity(count);
    for _ in 0..count {
        let id = reader.take(id_size, "recipient id")?.to_vec();
        let wrapped_key = WrappedKey::read(reader)?;
        recipients.push(RecipientEntry { id, wrapped_key });
    }

    ensure_unique(recipients.iter().map(|r| r.id.as_slice()))
        .map_err(|e| EciesError::MalformedHeader(e.to_string()))?;
    Ok(recipients)
}

pub(crate) fn check_count(count: usize, config: &EciesConfig) -> Result<()> {
    if count == 0 {
        return Err(EciesError::NoRecipients);
    }
    let max = config.multiple().max_recipients.min(u16::MAX as usize);
    if count > max {
        return Err(EciesError::TooManyRecipients { count, max });
    }
    Ok(())
}

/// Reject the first repeated ID
pub(crate) fn ensure_unique<'a>(ids: impl Iterator<Item = &'a [u8]>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(EciesError::DuplicateRecipient(hex::encode(id)));
        }
    }
    Ok(())
}
