// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caller-sized random identifiers (1-255 bytes, hex text form)

use super::{ensure_length, IdentifierProvider, MAX_CUSTOM_ID_LENGTH, MIN_CUSTOM_ID_LENGTH};
use crate::error::{EciesError, Result};
use rand::{rngs::OsRng, RngCore};

/// Provider for fixed-width random identifiers of a chosen length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomIdProvider {
    byte_length: usize,
}

impl CustomIdProvider {
    pub fn new(byte_length: usize) -> Result<Self> {
        if !(MIN_CUSTOM_ID_LENGTH..=MAX_CUSTOM_ID_LENGTH).contains(&byte_length) {
            return Err(EciesError::InvalidProviderLength(byte_length));
        }
        Ok(Self { byte_length })
    }

    pub(crate) fn clamped(byte_length: usize) -> Self {
        Self {
            byte_length: byte_length.clamp(MIN_CUSTOM_ID_LENGTH, MAX_CUSTOM_ID_LENGTH),
        }
    }
}

impl IdentifierProvider for CustomIdProvider {
    fn byte_length(&self) -> usize {
        self.byte_length
    }

    fn generate(&self) -> Vec<u8> {
        let mut id = vec![0u8; self.byte_length];
        OsRng.fill_bytes(&mut id);
        id
    }

    fn validate(&self, id: &[u8]) -> bool {
        id.len() == self.byte_length
    }

    fn id_to_string(&self, id: &[u8]) -> Result<String> {
        ensure_length(id, self.byte_length, "custom")?;
        Ok(hex::encode(id))
    }

    fn id_from_string(&self, text: &str) -> Result<Vec<u8>> {
        if text.len() != self.byte_length * 2 {
            return Err(EciesError::InvalidIdentifier(format!(
                "custom identifier text must be {} hex characters, got {}",
                self.byte_length * 2,
                text.len()
            )));
        }
        let bytes = hex::decode(text)
            .map_err(|e| EciesError::InvalidIdentifier(format!("invalid hex: {}", e)))?;
        ensure_length(&bytes, self.byte_length, "custom")?;
        Ok(bytes)
    }
}
