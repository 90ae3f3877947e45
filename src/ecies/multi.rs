// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multi-Recipient Mode
//!
//! One ephemeral key pair and one random message key per message. The
//! payload is encrypted once under the message key; the message key is
//! wrapped once per recipient.
//!
//! ## Encrypt
//!
//! 1. Validate recipients (count, ID width, uniqueness)
//! 2. Generate the ephemeral pair and the message key
//! 3. Per recipient: ECDH(ephemeral, recipient) → HKDF → AEAD-wrap the
//!    message key with AAD = recipient ID
//! 4. Encrypt the payload under the message key with AAD = header bytes
//!
//! ## Decrypt
//!
//! Parse → locate the caller's entry → unwrap → decrypt. Both AEAD stages
//! fail with the same opaque `DecryptionFailed`.

use super::Recipient;
use crate::config::EciesConfig;
use crate::crypto::aead::{
    aead_decrypt, aead_encrypt, generate_iv, generate_message_key, KEY_SIZE, TAG_SIZE,
};
use crate::crypto::ecdh::{
    normalize_public_key, parse_public_key, shared_secret, EciesKeyPair,
    COMPRESSED_PUBLIC_KEY_SIZE,
};
use crate::crypto::kdf::derive_symmetric_key;
use crate::error::{EciesError, Result};
use crate::frame::header::{
    check_count, ensure_unique, HeaderBody, MessageHeader, RecipientEntry, WrappedKey,
};
use tracing::debug;
use zeroize::Zeroizing;

/// Validate the recipient list against the configuration
pub(crate) fn validate_recipients(config: &EciesConfig, recipients: &[Recipient]) -> Result<()> {
    check_count(recipients.len(), config)?;
    let id_size = config.multiple().recipient_id_size;
    for recipient in recipients {
        if recipient.id.len() != id_size {
            return Err(EciesError::InvalidIdentifier(format!(
                "recipient id must be {} bytes, got {}",
                id_size,
                recipient.id.len()
            )));
        }
    }
    ensure_unique(recipients.iter().map(|r| r.id.as_slice()))
}

/// Wrap `message_key` for one recipient
pub(crate) fn wrap_key(
    config: &EciesConfig,
    ephemeral: &EciesKeyPair,
    recipient: &Recipient,
    message_key: &[u8; KEY_SIZE],
) -> Result<RecipientEntry> {
    let peer = parse_public_key(&recipient.public_key)?;
    let secret = shared_secret(ephemeral.secret_key(), &peer);
    let kek = derive_symmetric_key(secret.as_ref(), config)?;

    let iv = generate_iv();
    let (encrypted, tag) = aead_encrypt(&kek, &iv, &recipient.id, message_key)?;

    let mut encrypted_key = [0u8; KEY_SIZE];
    encrypted_key.copy_from_slice(&encrypted);

    Ok(RecipientEntry {
        id: recipient.id.clone(),
        wrapped_key: WrappedKey {
            ephemeral_public_key: ephemeral.public_key_uncompressed(),
            iv,
            tag,
            encrypted_key,
        },
    })
}

/// Recover the message key from the caller's entry
///
/// The ephemeral key embedded in the wrapped block must match the one in
/// the header; a mismatch is treated like any other authentication failure.
pub(crate) fn unwrap_key(
    config: &EciesConfig,
    key_pair: &EciesKeyPair,
    header_ephemeral: &[u8; COMPRESSED_PUBLIC_KEY_SIZE],
    entry: &RecipientEntry,
) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let embedded = normalize_public_key(&entry.wrapped_key.ephemeral_public_key)
        .map_err(|_| EciesError::DecryptionFailed)?;
    if &embedded != header_ephemeral {
        return Err(EciesError::DecryptionFailed);
    }

    let secret = key_pair
        .diffie_hellman(header_ephemeral)
        .map_err(|_| EciesError::DecryptionFailed)?;
    let kek = derive_symmetric_key(secret.as_ref(), config)?;

    let wrapped = &entry.wrapped_key;
    let plain = Zeroizing::new(aead_decrypt(
        &kek,
        &wrapped.iv,
        &entry.id,
        &wrapped.encrypted_key,
        &wrapped.tag,
    )?);

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    key.copy_from_slice(&plain);
    Ok(key)
}

/// Encrypt once for every recipient
pub(crate) fn encrypt(
    config: &EciesConfig,
    recipients: &[Recipient],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    validate_recipients(config, recipients)?;

    let ephemeral = EciesKeyPair::generate();
    let message_key = generate_message_key();

    let entries = recipients
        .iter()
        .map(|recipient| wrap_key(config, &ephemeral, recipient, &message_key))
        .collect::<Result<Vec<_>>>()?;

    let mut header = MessageHeader {
        ephemeral_public_key: ephemeral.public_key_compressed(),
        iv: generate_iv(),
        auth_tag: [0u8; TAG_SIZE],
        body: HeaderBody::Multiple {
            recipients: entries,
        },
    };
    let aad = header.aad_bytes(config)?;

    let (ciphertext, tag) = aead_encrypt(message_key.as_ref(), &header.iv, &aad, plaintext)?;
    header.auth_tag = tag;

    let mut envelope = header.encode(config)?;
    envelope.extend_from_slice(&ciphertext);

    debug!(
        mode = "multiple",
        recipients = recipients.len(),
        plaintext_len = plaintext.len(),
        envelope_len = envelope.len(),
        "Encrypted envelope"
    );
    Ok(envelope)
}

/// Decrypt as the recipient identified by `recipient_id`
pub(crate) fn decrypt(
    config: &EciesConfig,
    recipient_id: &[u8],
    key_pair: &EciesKeyPair,
    envelope: &[u8],
) -> Result<Vec<u8>> {
    let (header, header_len) = MessageHeader::decode(envelope, config)?;
    let HeaderBody::Multiple { recipients } = &header.body else {
        return Err(EciesError::UnsupportedEncryptionType(header.mode().tag()));
    };

    let entry = recipients
        .iter()
        .find(|entry| entry.id == recipient_id)
        .ok_or(EciesError::RecipientNotFound)?;

    let message_key = unwrap_key(config, key_pair, &header.ephemeral_public_key, entry)?;

    let aad = header.aad_bytes(config)?;
    let plaintext = aead_decrypt(
        message_key.as_ref(),
        &header.iv,
        &aad,
        &envelope[header_len..],
        &header.auth_tag,
    )?;

    debug!(
        mode = "multiple",
        recipients = recipients.len(),
        plaintext_len = plaintext.len(),
        "Decrypted envelope"
    );
    Ok(plaintext)
}
