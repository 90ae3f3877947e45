// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Simple and Single Modes
//!
//! One recipient, no key wrapping: the HKDF output of
//! ECDH(ephemeral, recipient) encrypts the payload directly. "single" adds
//! the plaintext length to the header, which is checked against the
//! ciphertext before any decryption work.

use crate::config::EciesConfig;
use crate::crypto::aead::{aead_decrypt, aead_encrypt, generate_iv, TAG_SIZE};
use crate::crypto::ecdh::{parse_public_key, shared_secret, EciesKeyPair};
use crate::crypto::kdf::derive_symmetric_key;
use crate::error::{EciesError, Result};
use crate::frame::header::{EncryptionMode, HeaderBody, MessageHeader};
use tracing::{debug, warn};

/// Encrypt for one recipient in simple or single mode
pub(crate) fn encrypt(
    config: &EciesConfig,
    mode: EncryptionMode,
    recipient_public_key: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let body = match mode {
        EncryptionMode::Simple => HeaderBody::Simple,
        EncryptionMode::Single => HeaderBody::Single {
            data_length: plaintext.len() as u64,
        },
        EncryptionMode::Multiple => {
            return Err(EciesError::UnsupportedEncryptionType(mode.tag()));
        }
    };

    // 1. Parse recipient key, generate ephemeral pair
    let recipient = parse_public_key(recipient_public_key)?;
    let ephemeral = EciesKeyPair::generate();

    // 2. ECDH + HKDF
    let secret = shared_secret(ephemeral.secret_key(), &recipient);
    let key = derive_symmetric_key(secret.as_ref(), config)?;

    // 3. Header without tag is the AAD
    let mut header = MessageHeader {
        ephemeral_public_key: ephemeral.public_key_compressed(),
        iv: generate_iv(),
        auth_tag: [0u8; TAG_SIZE],
        body,
    };
    let aad = header.aad_bytes(config)?;

    // 4. Encrypt and seal the tag into the header
    let (ciphertext, tag) = aead_encrypt(&key, &header.iv, &aad, plaintext)?;
    header.auth_tag = tag;

    let mut envelope = header.encode(config)?;
    envelope.extend_from_slice(&ciphertext);

    debug!(
        mode = mode.name(),
        plaintext_len = plaintext.len(),
        envelope_len = envelope.len(),
        "Encrypted envelope"
    );
    Ok(envelope)
}

/// Decrypt a simple or single envelope
pub(crate) fn decrypt(
    config: &EciesConfig,
    key_pair: &EciesKeyPair,
    envelope: &[u8],
) -> Result<Vec<u8>> {
    let (header, header_len) = MessageHeader::decode(envelope, config)?;
    let ciphertext = &envelope[header_len..];

    match header.body {
        HeaderBody::Simple => {}
        HeaderBody::Single { data_length } => {
            // authenticated field; a mismatch is a tampered header
            if data_length != ciphertext.len() as u64 {
                warn!(
                    declared = data_length,
                    actual = ciphertext.len(),
                    "❌ Single-mode length field disagrees with ciphertext"
                );
                return Err(EciesError::DecryptionFailed);
            }
        }
        HeaderBody::Multiple { .. } => {
            return Err(EciesError::UnsupportedEncryptionType(
                EncryptionMode::Multiple.tag(),
            ));
        }
    }

    // A header key that is not a curve point is a tampered header.
    let secret = key_pair
        .diffie_hellman(&header.ephemeral_public_key)
        .map_err(|_| EciesError::DecryptionFailed)?;
    let key = derive_symmetric_key(secret.as_ref(), config)?;

    let aad = header.aad_bytes(config)?;
    let plaintext = aead_decrypt(&key, &header.iv, &aad, ciphertext, &header.auth_tag)?;

    debug!(
        mode = header.mode().name(),
        plaintext_len = plaintext.len(),
        "Decrypted envelope"
    );
    Ok(plaintext)
}
