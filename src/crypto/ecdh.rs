// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDH Key Exchange on secp256k1
//!
//! Key pairs, public-key normalisation and shared-secret agreement. Public
//! keys are accepted in three encodings and normalised to the compressed
//! form the header carries:
//!
//! | Input     | Bytes | Shape              |
//! |-----------|-------|--------------------|
//! | Compressed| 33    | 0x02/0x03 ‖ x      |
//! | Uncompressed | 65 | 0x04 ‖ x ‖ y       |
//! | Raw       | 64    | x ‖ y (no prefix)  |

use crate::error::{EciesError, Result};
use k256::{
    elliptic_curve::sec1::ToEncodedPoint,
    PublicKey, SecretKey,
};
use rand::rngs::OsRng;
use std::fmt;
use zeroize::Zeroizing;

/// Compressed public key length
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;

/// Uncompressed (prefixed) public key length
pub const UNCOMPRESSED_PUBLIC_KEY_SIZE: usize = 65;

/// Raw x ‖ y public key length
pub const RAW_PUBLIC_KEY_SIZE: usize = 64;

/// Private scalar length
pub const PRIVATE_KEY_SIZE: usize = 32;

const UNCOMPRESSED_PREFIX: u8 = 0x04;

/// secp256k1 key pair
///
/// The secret scalar zeroises itself on drop.
#[derive(Clone)]
pub struct EciesKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl EciesKeyPair {
    /// Fresh random key pair
    pub fn generate() -> Self {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Key pair from a 32-byte private scalar
    pub fn from_private_key(private_key: &[u8]) -> Result<Self> {
        if private_key.len() != PRIVATE_KEY_SIZE {
            return Err(EciesError::invalid_key(
                "private",
                format!(
                    "expected {} bytes, got {}",
                    PRIVATE_KEY_SIZE,
                    private_key.len()
                ),
            ));
        }
        let secret = SecretKey::from_slice(private_key)
            .map_err(|_| EciesError::invalid_key("private", "scalar is zero or out of range"))?;
        let public = secret.public_key();
        Ok(Self { secret, public })
    }

    /// The private scalar (zeroised when the returned value drops)
    pub fn private_key_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_SIZE]> {
        let mut out = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        out.copy_from_slice(self.secret.to_bytes().as_slice());
        out
    }

    pub fn public_key_compressed(&self) -> [u8; COMPRESSED_PUBLIC_KEY_SIZE] {
        encode_compressed(&self.public)
    }

    pub fn public_key_uncompressed(&self) -> [u8; UNCOMPRESSED_PUBLIC_KEY_SIZE] {
        encode_uncompressed(&self.public)
    }

    /// ECDH with a peer public key in any accepted encoding
    pub fn diffie_hellman(&self, peer_public: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
        let peer = parse_public_key(peer_public)?;
        Ok(shared_secret(&self.secret, &peer))
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.secret
    }
}

impl fmt::Debug for EciesKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EciesKeyPair")
            .field("public", &hex::encode(self.public_key_compressed()))
            .finish_non_exhaustive()
    }
}

/// Parse a public key in compressed, uncompressed or raw form
pub(crate) fn parse_public_key(bytes: &[u8]) -> Result<PublicKey> {
    let parsed = match bytes.len() {
        COMPRESSED_PUBLIC_KEY_SIZE => PublicKey::from_sec1_bytes(bytes),
        UNCOMPRESSED_PUBLIC_KEY_SIZE => {
            if bytes[0] != UNCOMPRESSED_PREFIX {
                return Err(EciesError::invalid_key(
                    "public",
                    format!("uncompressed key must start with 0x04, got {:#04x}", bytes[0]),
                ));
            }
            PublicKey::from_sec1_bytes(bytes)
        }
        RAW_PUBLIC_KEY_SIZE => {
            let mut prefixed = [0u8; UNCOMPRESSED_PUBLIC_KEY_SIZE];
            prefixed[0] = UNCOMPRESSED_PREFIX;
            prefixed[1..].copy_from_slice(bytes);
            PublicKey::from_sec1_bytes(&prefixed)
        }
        other => {
            return Err(EciesError::invalid_key(
                "public",
                format!("expected 33, 64 or 65 bytes, got {}", other),
            ))
        }
    };
    parsed.map_err(|_| EciesError::invalid_key("public", "not a point on secp256k1"))
}

fn encode_compressed(public: &PublicKey) -> [u8; COMPRESSED_PUBLIC_KEY_SIZE] {
    let mut out = [0u8; COMPRESSED_PUBLIC_KEY_SIZE];
    out.copy_from_slice(public.to_encoded_point(true).as_bytes());
    out
}

fn encode_uncompressed(public: &PublicKey) -> [u8; UNCOMPRESSED_PUBLIC_KEY_SIZE] {
    let mut out = [0u8; UNCOMPRESSED_PUBLIC_KEY_SIZE];
    out.copy_from_slice(public.to_encoded_point(false).as_bytes());
    out
}

/// Normalise any accepted public key encoding to 33-byte compressed form
pub fn normalize_public_key(bytes: &[u8]) -> Result<[u8; COMPRESSED_PUBLIC_KEY_SIZE]> {
    parse_public_key(bytes).map(|key| encode_compressed(&key))
}

/// Expand any accepted public key encoding to 65-byte uncompressed form
pub fn decompress_public_key(bytes: &[u8]) -> Result<[u8; UNCOMPRESSED_PUBLIC_KEY_SIZE]> {
    parse_public_key(bytes).map(|key| encode_uncompressed(&key))
}

pub(crate) fn shared_secret(secret: &SecretKey, peer: &PublicKey) -> Zeroizing<[u8; 32]> {
    let shared = k256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(shared.raw_secret_bytes().as_slice());
    out
}

/// ECDH shared secret (x-coordinate of the shared point)
///
/// # Arguments
///
/// * `private_key` - 32-byte private scalar
/// * `peer_public` - Peer public key (33, 64 or 65 bytes)
pub fn derive_shared_secret(private_key: &[u8], peer_public: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    EciesKeyPair::from_private_key(private_key)?.diffie_hellman(peer_public)
}
