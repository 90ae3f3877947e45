// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! 16-byte GUID/UUID identifiers
//!
//! Both providers generate random (version 4) UUIDs and differ in their text
//! convention: [`GuidV4Provider`] uses base64 of the raw bytes, while
//! [`UuidProvider`] uses the familiar dashed-hex form.

use super::{ensure_length, IdentifierProvider};
use crate::error::{EciesError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use uuid::{Uuid, Variant};

/// Width of GUID/UUID identifiers
pub const GUID_BYTE_LENGTH: usize = 16;

const DASHED_TEXT_LENGTH: usize = 36;
const BASE64_TEXT_LENGTH: usize = 24;

fn to_uuid(id: &[u8]) -> Option<Uuid> {
    Uuid::from_slice(id).ok()
}

/// Version-4 GUIDs with base64 text form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuidV4Provider;

impl IdentifierProvider for GuidV4Provider {
    fn byte_length(&self) -> usize {
        GUID_BYTE_LENGTH
    }

    fn generate(&self) -> Vec<u8> {
        Uuid::new_v4().as_bytes().to_vec()
    }

    fn validate(&self, id: &[u8]) -> bool {
        match to_uuid(id) {
            Some(uuid) => uuid.get_version_num() == 4 && uuid.get_variant() == Variant::RFC4122,
            None => false,
        }
    }

    fn id_to_string(&self, id: &[u8]) -> Result<String> {
        ensure_length(id, GUID_BYTE_LENGTH, "guid_v4")?;
        Ok(STANDARD.encode(id))
    }

    fn id_from_string(&self, text: &str) -> Result<Vec<u8>> {
        if text.len() != BASE64_TEXT_LENGTH {
            return Err(EciesError::InvalidIdentifier(format!(
                "guid_v4 text must be {} base64 characters, got {}",
                BASE64_TEXT_LENGTH,
                text.len()
            )));
        }
        let bytes = STANDARD
            .decode(text)
            .map_err(|e| EciesError::InvalidIdentifier(format!("invalid base64: {}", e)))?;
        ensure_length(&bytes, GUID_BYTE_LENGTH, "guid_v4")?;
        if !self.validate(&bytes) {
            return Err(EciesError::InvalidIdentifier(
                "guid_v4 text does not decode to a version 4 GUID".to_string(),
            ));
        }
        Ok(bytes)
    }
}

/// RFC 4122 UUIDs with dashed-hex text form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UuidProvider;

impl IdentifierProvider for UuidProvider {
    fn byte_length(&self) -> usize {
        GUID_BYTE_LENGTH
    }

    fn generate(&self) -> Vec<u8> {
        Uuid::new_v4().as_bytes().to_vec()
    }

    fn validate(&self, id: &[u8]) -> bool {
        match to_uuid(id) {
            Some(uuid) => !uuid.is_nil() && uuid.get_variant() == Variant::RFC4122,
            None => false,
        }
    }

    fn id_to_string(&self, id: &[u8]) -> Result<String> {
        ensure_length(id, GUID_BYTE_LENGTH, "uuid")?;
        let uuid = to_uuid(id)
            .ok_or_else(|| EciesError::InvalidIdentifier("not a UUID".to_string()))?;
        Ok(uuid.hyphenated().to_string())
    }

    fn id_from_string(&self, text: &str) -> Result<Vec<u8>> {
        // Only the hyphenated form is canonical; braced/urn/simple are refused.
        if text.len() != DASHED_TEXT_LENGTH {
            return Err(EciesError::InvalidIdentifier(format!(
                "uuid text must be {} characters, got {}",
                DASHED_TEXT_LENGTH,
                text.len()
            )));
        }
        let uuid = Uuid::try_parse(text)
            .map_err(|e| EciesError::InvalidIdentifier(format!("invalid uuid: {}", e)))?;
        let bytes = uuid.as_bytes().to_vec();
        if !self.validate(&bytes) {
            return Err(EciesError::InvalidIdentifier(
                "uuid is nil or not RFC 4122".to_string(),
            ));
        }
        Ok(bytes)
    }
}
