// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECIES Engine
//!
//! [`Ecies`] is the entry point: it binds a validated configuration and
//! exposes every envelope operation. It holds no other state, so clones are
//! cheap and calls are independent.
//!
//! ## Modes
//!
//! | Mode     | Tag | Recipients | Key                        |
//! |----------|-----|------------|----------------------------|
//! | simple   | 33  | 1          | HKDF(ECDH) directly        |
//! | single   | 66  | 1          | HKDF(ECDH) directly        |
//! | multiple | 99  | 1..=65535  | random key, wrapped per ID |
//!
//! ## Example
//!
//! ```rust
//! use fabstir_ecies::{Ecies, EciesKeyPair};
//!
//! let ecies = Ecies::default();
//! let alice = EciesKeyPair::generate();
//!
//! let envelope = ecies.encrypt_simple(&alice.public_key_compressed(), b"hi").unwrap();
//! let plain = ecies
//!     .decrypt_simple_or_single(alice.private_key_bytes().as_ref(), &envelope)
//!     .unwrap();
//! assert_eq!(plain, b"hi");
//! ```

pub mod multi;
pub mod single;

use crate::config::{ConfigRegistry, EciesConfig};
use crate::crypto::ecdh::EciesKeyPair;
use crate::error::{EciesError, Result};
use crate::frame::header::{check_count, EncryptionMode, MessageHeader, WRAPPED_KEY_SIZE};
use crate::streaming::{self, StreamOptions, StreamSummary};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// One addressee of a multi-recipient message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Identifier bytes (width = configured recipient ID size)
    pub id: Vec<u8>,
    /// Public key in compressed, uncompressed or raw form
    pub public_key: Vec<u8>,
}

impl Recipient {
    pub fn new(id: impl Into<Vec<u8>>, public_key: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            public_key: public_key.into(),
        }
    }
}

/// ECIES engine bound to one configuration
#[derive(Debug, Clone)]
pub struct Ecies {
    config: Arc<EciesConfig>,
}

impl Default for Ecies {
    fn default() -> Self {
        Self::new(Arc::new(EciesConfig::default()))
    }
}

impl Ecies {
    pub fn new(config: Arc<EciesConfig>) -> Self {
        Self { config }
    }

    /// Engine using the registry entry for `key` (default when unknown)
    pub fn from_registry(registry: &ConfigRegistry, key: &str) -> Self {
        Self::new(registry.get(key))
    }

    pub fn config(&self) -> &EciesConfig {
        &self.config
    }

    /// Fresh key pair on the configured curve
    pub fn generate_key_pair(&self) -> EciesKeyPair {
        EciesKeyPair::generate()
    }

    /// Simple mode: header + ciphertext, no length field
    pub fn encrypt_simple(&self, recipient_public_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        single::encrypt(
            &self.config,
            EncryptionMode::Simple,
            recipient_public_key,
            plaintext,
        )
    }

    /// Single mode: header carries the plaintext length
    pub fn encrypt_single(&self, recipient_public_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        single::encrypt(
            &self.config,
            EncryptionMode::Single,
            recipient_public_key,
            plaintext,
        )
    }

    /// Decrypt a simple or single envelope
    pub fn decrypt_simple_or_single(&self, private_key: &[u8], envelope: &[u8]) -> Result<Vec<u8>> {
        let key_pair = EciesKeyPair::from_private_key(private_key)?;
        single::decrypt(&self.config, &key_pair, envelope)
    }

    /// One envelope readable by every listed recipient
    pub fn encrypt_multiple(&self, recipients: &[Recipient], plaintext: &[u8]) -> Result<Vec<u8>> {
        multi::encrypt(&self.config, recipients, plaintext)
    }

    /// Decrypt a multi-recipient envelope as `recipient_id`
    pub fn decrypt_multiple(
        &self,
        recipient_id: &[u8],
        private_key: &[u8],
        envelope: &[u8],
    ) -> Result<Vec<u8>> {
        let key_pair = EciesKeyPair::from_private_key(private_key)?;
        multi::decrypt(&self.config, recipient_id, &key_pair, envelope)
    }

    /// Encrypt in any mode
    ///
    /// Simple and single modes take exactly one recipient; its ID is ignored.
    pub fn encrypt(
        &self,
        mode: EncryptionMode,
        recipients: &[Recipient],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        match mode {
            EncryptionMode::Simple | EncryptionMode::Single => {
                let recipient = sole_recipient(recipients)?;
                single::encrypt(&self.config, mode, &recipient.public_key, plaintext)
            }
            EncryptionMode::Multiple => multi::encrypt(&self.config, recipients, plaintext),
        }
    }

    /// Decrypt any mode, dispatching on the type tag
    ///
    /// `recipient_id` is required for multi-recipient envelopes and ignored
    /// otherwise.
    pub fn decrypt(
        &self,
        private_key: &[u8],
        recipient_id: Option<&[u8]>,
        envelope: &[u8],
    ) -> Result<Vec<u8>> {
        let Some(&tag) = envelope.first() else {
            return Err(EciesError::MalformedHeader("empty envelope".to_string()));
        };
        let key_pair = EciesKeyPair::from_private_key(private_key)?;

        match EncryptionMode::from_tag(tag)? {
            EncryptionMode::Simple | EncryptionMode::Single => {
                single::decrypt(&self.config, &key_pair, envelope)
            }
            EncryptionMode::Multiple => {
                let id = recipient_id.ok_or_else(|| {
                    EciesError::InvalidIdentifier(
                        "recipient id required for multi-recipient envelopes".to_string(),
                    )
                })?;
                multi::decrypt(&self.config, id, &key_pair, envelope)
            }
        }
    }

    /// Parse the header of an envelope without decrypting
    pub fn parse_header(&self, envelope: &[u8]) -> Result<MessageHeader> {
        MessageHeader::decode(envelope, &self.config).map(|(header, _)| header)
    }

    /// Envelope size for a plaintext of `plaintext_len` bytes
    ///
    /// `recipient_count` only matters for the multiple mode.
    pub fn compute_encrypted_length(
        &self,
        mode: EncryptionMode,
        plaintext_len: usize,
        recipient_count: usize,
    ) -> Result<usize> {
        let overhead = match mode {
            EncryptionMode::Simple | EncryptionMode::Single => mode.fixed_overhead(&self.config),
            EncryptionMode::Multiple => {
                check_count(recipient_count, &self.config)?;
                let entry = self.config.multiple().recipient_id_size + WRAPPED_KEY_SIZE;
                mode.fixed_overhead(&self.config) + recipient_count * entry
            }
        };
        overhead
            .checked_add(plaintext_len)
            .ok_or(EciesError::LengthTooLong {
                length: plaintext_len as u64,
                max: (usize::MAX - overhead) as u64,
            })
    }

    /// Chunked encryption from `reader` to `writer`
    ///
    /// Simple and single modes produce a single-recipient stream; multiple
    /// wraps a stream key per recipient.
    pub async fn encrypt_stream<R, W>(
        &self,
        mode: EncryptionMode,
        recipients: &[Recipient],
        reader: &mut R,
        writer: &mut W,
        options: StreamOptions,
    ) -> Result<StreamSummary>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let target = match mode {
            EncryptionMode::Simple | EncryptionMode::Single => {
                streaming::StreamTarget::Single(sole_recipient(recipients)?.public_key.as_slice())
            }
            EncryptionMode::Multiple => streaming::StreamTarget::Multiple(recipients),
        };
        streaming::encrypt_stream(&self.config, target, reader, writer, options).await
    }

    /// Chunked decryption from `reader` to `writer`
    ///
    /// Plaintext reaches `writer` one verified chunk at a time. On error,
    /// chunks written before the failing one stay written unless
    /// [`StreamOptions::withhold_until_verified`] is set.
    pub async fn decrypt_stream<R, W>(
        &self,
        private_key: &[u8],
        recipient_id: Option<&[u8]>,
        reader: &mut R,
        writer: &mut W,
        options: StreamOptions,
    ) -> Result<StreamSummary>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let key_pair = EciesKeyPair::from_private_key(private_key)?;
        streaming::decrypt_stream(&self.config, &key_pair, recipient_id, reader, writer, options)
            .await
    }
}

fn sole_recipient(recipients: &[Recipient]) -> Result<&Recipient> {
    match recipients {
        [] => Err(EciesError::NoRecipients),
        [only] => Ok(only),
        _ => Err(EciesError::TooManyRecipients {
            count: recipients.len(),
            max: 1,
        }),
    }
}
