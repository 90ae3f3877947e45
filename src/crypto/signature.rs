// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDSA Signatures
//!
//! Auxiliary authentication for callers that want to prove who produced an
//! envelope. The envelope itself is not signed; sign the encrypted bytes if
//! sender authenticity matters.
//!
//! Signatures are secp256k1 ECDSA over SHA-256 of the message, in 64-byte
//! compact `r ‖ s` form with low-S normalisation.

use super::ecdh::normalize_public_key;
use crate::error::{EciesError, Result};
use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};

/// Compact signature length (r ‖ s)
pub const SIGNATURE_SIZE: usize = 64;

/// Sign `message` with a 32-byte private key
///
/// # Example
///
/// ```ignore
/// let sig = sign(&private_key, &envelope)?;
/// verify(&sender_public_key, &envelope, &sig)?;
/// ```
pub fn sign(private_key: &[u8], message: &[u8]) -> Result<[u8; SIGNATURE_SIZE]> {
    let signing_key = SigningKey::from_slice(private_key)
        .map_err(|_| EciesError::invalid_key("private", "not a valid secp256k1 scalar"))?;

    let signature: Signature = signing_key.sign(message);

    let mut out = [0u8; SIGNATURE_SIZE];
    out.copy_from_slice(signature.to_bytes().as_slice());
    Ok(out)
}

/// Verify a compact signature against a public key in any accepted encoding
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
    // 1. Normalise the key (33/64/65 bytes accepted)
    let compressed = normalize_public_key(public_key)?;
    let verifying_key = VerifyingKey::from_sec1_bytes(&compressed)
        .map_err(|_| EciesError::invalid_key("public", "not a point on secp256k1"))?;

    // 2. Parse the signature
    if signature.len() != SIGNATURE_SIZE {
        return Err(EciesError::InvalidSignature);
    }
    let signature = Signature::from_slice(signature).map_err(|_| EciesError::InvalidSignature)?;

    // 3. Verify
    verifying_key
        .verify(message, &signature)
        .map_err(|_| EciesError::InvalidSignature)
}
