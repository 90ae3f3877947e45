// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Key Derivation
//!
//! Shared secrets are never used as keys directly. They go through
//! HKDF-SHA256 with an empty salt and a fixed, versioned info string so
//! keys derived here cannot collide with keys derived by other protocols
//! from the same ECDH output.

use crate::config::EciesConfig;
use crate::error::{EciesError, Result};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

/// HKDF info string; bump the version suffix on any wire-format change
pub const HKDF_INFO: &[u8] = b"fabstir-ecies/v1";

/// Derive the symmetric key for a shared secret
///
/// Output length is `config.key_size()` (32 for AES-256).
///
/// # Example
///
/// ```ignore
/// let secret = derive_shared_secret(&private, &peer_public)?;
/// let key = derive_symmetric_key(secret.as_slice(), &config)?;
/// ```
pub fn derive_symmetric_key(
    shared_secret: &[u8],
    config: &EciesConfig,
) -> Result<Zeroizing<Vec<u8>>> {
    if shared_secret.is_empty() {
        return Err(EciesError::invalid_key("shared_secret", "empty input"));
    }

    let hkdf = Hkdf::<Sha256>::new(None, shared_secret);
    let mut key = Zeroizing::new(vec![0u8; config.key_size()]);
    hkdf.expand(HKDF_INFO, key.as_mut_slice())
        .map_err(|e| EciesError::invalid_key("symmetric", format!("HKDF expand failed: {}", e)))?;

    Ok(key)
}
