// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! AES-256-GCM with 16-byte IVs
//!
//! The envelope format carries a 16-byte IV, not the 12-byte nonce
//! `Aes256Gcm` defaults to, so the cipher is instantiated with a `U16` nonce
//! size. GCM hashes non-96-bit IVs through GHASH; peers using Web Crypto
//! with a 16-byte `iv` produce the same output.
//!
//! **Layout**: ciphertext and tag are kept apart (detached) because the
//! header stores the tag in a fixed slot ahead of the ciphertext.

use crate::error::{EciesError, Result};
use aes_gcm::{
    aead::{consts::U16, AeadInPlace, KeyInit},
    aes::Aes256,
    AesGcm, Nonce, Tag,
};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

/// AES-256-GCM with a 128-bit nonce
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Symmetric key size in bytes
pub const KEY_SIZE: usize = 32;

/// IV size in bytes
pub const IV_SIZE: usize = 16;

/// Authentication tag size in bytes
pub const TAG_SIZE: usize = 16;

/// Fresh random IV
pub fn generate_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);
    iv
}

/// Fresh random message key (multi-recipient and streaming)
pub fn generate_message_key() -> Zeroizing<[u8; KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    OsRng.fill_bytes(key.as_mut());
    key
}

fn cipher(key: &[u8]) -> Result<Aes256Gcm16> {
    if key.len() != KEY_SIZE {
        return Err(EciesError::invalid_key(
            "symmetric",
            format!("expected {} bytes, got {}", KEY_SIZE, key.len()),
        ));
    }
    Aes256Gcm16::new_from_slice(key)
        .map_err(|e| EciesError::invalid_key("symmetric", e.to_string()))
}

/// Encrypt `plaintext`, returning `(ciphertext, tag)`
///
/// The ciphertext has exactly the plaintext's length.
pub fn aead_encrypt(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_SIZE])> {
    let mut buffer = plaintext.to_vec();
    let tag = aead_encrypt_in_place(key, iv, aad, &mut buffer)?;
    Ok((buffer, tag))
}

/// Verify `tag` and decrypt `ciphertext`
///
/// Any failure (wrong key, wrong AAD, tampered bytes, malformed IV or tag)
/// is reported as [`EciesError::DecryptionFailed`]. No plaintext escapes
/// unless the tag verifies.
pub fn aead_decrypt(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>> {
    let mut buffer = ciphertext.to_vec();
    aead_decrypt_in_place(key, iv, aad, &mut buffer, tag)?;
    Ok(buffer)
}

/// In-place variant of [`aead_encrypt`]; `buffer` becomes the ciphertext
pub fn aead_encrypt_in_place(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    buffer: &mut Vec<u8>,
) -> Result<[u8; TAG_SIZE]> {
    let cipher = cipher(key)?;
    if iv.len() != IV_SIZE {
        return Err(EciesError::EncryptionFailed(format!(
            "IV must be {} bytes, got {}",
            IV_SIZE,
            iv.len()
        )));
    }
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<U16>::from_slice(iv), aad, buffer)
        .map_err(|e| EciesError::EncryptionFailed(e.to_string()))?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(tag.as_slice());
    Ok(tag_bytes)
}

/// In-place variant of [`aead_decrypt`]
///
/// On failure the buffer contents are unspecified and must be discarded.
pub fn aead_decrypt_in_place(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    buffer: &mut Vec<u8>,
    tag: &[u8],
) -> Result<()> {
    if iv.len() != IV_SIZE || tag.len() != TAG_SIZE {
        return Err(EciesError::DecryptionFailed);
    }
    let cipher = cipher(key).map_err(|_| EciesError::DecryptionFailed)?;
    cipher
        .decrypt_in_place_detached(
            Nonce::<U16>::from_slice(iv),
            aad,
            buffer,
            Tag::from_slice(tag),
        )
        .map_err(|_| EciesError::DecryptionFailed)
}
