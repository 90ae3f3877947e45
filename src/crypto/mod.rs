// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Cryptographic Primitives
//!
//! Thin wrappers over the primitive crates. Everything protocol-shaped
//! (framing, key wrapping, streaming) lives in [`crate::ecies`] and
//! [`crate::streaming`]; this module only turns bytes into bytes.
//!
//! - **ECDH**: secp256k1 key pairs and shared-secret agreement (k256)
//! - **KDF**: HKDF-SHA256 with a fixed protocol info string
//! - **AEAD**: AES-256-GCM with a 16-byte IV and detached 16-byte tag
//! - **Signature**: ECDSA over SHA-256, 64-byte compact form
//! - **Secure buffers**: masked in-memory storage for secrets
//!
//! ## Security Considerations
//!
//! - Private scalars, shared secrets and derived keys are zeroised on drop
//! - Every AEAD failure maps to the single opaque `DecryptionFailed`
//! - Nothing here logs key material

pub mod aead;
pub mod ecdh;
pub mod kdf;
pub mod secure;
pub mod signature;

pub use aead::{
    aead_decrypt, aead_decrypt_in_place, aead_encrypt, aead_encrypt_in_place, generate_iv,
    generate_message_key,
};
pub use ecdh::{decompress_public_key, derive_shared_secret, normalize_public_key, EciesKeyPair};
pub use kdf::{derive_symmetric_key, HKDF_INFO};
pub use secure::{SecureBuffer, SecureString};
pub use signature::{sign, verify, SIGNATURE_SIZE};
