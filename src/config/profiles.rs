// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PBKDF2 profiles
//!
//! Password workflows live outside this crate. The profiles ride along in the
//! configuration so those workflows read one validated parameter set; the
//! engine itself only checks their bounds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters for one password-derivation profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pbkdf2Profile {
    /// Derived key length in bytes
    pub hash_bytes: usize,
    /// Salt length in bytes
    pub salt_bytes: usize,
    pub iterations: u32,
    /// Digest name, e.g. `sha256` / `sha512`
    pub algorithm: String,
}

impl Pbkdf2Profile {
    fn new(hash_bytes: usize, salt_bytes: usize, iterations: u32, algorithm: &str) -> Self {
        Self {
            hash_bytes,
            salt_bytes,
            iterations,
            algorithm: algorithm.to_string(),
        }
    }
}

pub(crate) fn default_profiles() -> BTreeMap<String, Pbkdf2Profile> {
    let mut profiles = BTreeMap::new();
    profiles.insert(
        "browser_password".to_string(),
        Pbkdf2Profile::new(32, 64, 2_000_000, "sha512"),
    );
    profiles.insert(
        "high_security".to_string(),
        Pbkdf2Profile::new(64, 32, 5_000_000, "sha256"),
    );
    profiles.insert(
        "test_fast".to_string(),
        Pbkdf2Profile::new(32, 64, 1_000, "sha512"),
    );
    profiles
}
