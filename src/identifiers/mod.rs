// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recipient Identifier Providers
//!
//! Multi-recipient envelopes address each recipient by a fixed-width ID. The
//! width comes from the configured provider and drives several configuration
//! constants (`member_id_length`, `multiple.recipient_id_size`), so the
//! provider is part of [`crate::config::EciesConfig`] and read-only after the
//! configuration is built.
//!
//! ## Providers
//!
//! | Variant  | Bytes | Text form            | Structure check          |
//! |----------|-------|----------------------|--------------------------|
//! | ObjectId | 12    | 24 lowercase hex     | length                   |
//! | GuidV4   | 16    | base64 (24 chars)    | version 4, RFC 4122      |
//! | Uuid     | 16    | dashed hex (36)      | RFC 4122 variant, !nil   |
//! | Custom   | 1-255 | lowercase hex        | length                   |
//!
//! Text parsing fails closed: malformed input is rejected, never coerced.

pub mod custom;
pub mod guid;
pub mod object_id;

use crate::error::{EciesError, Result};
use serde::{Deserialize, Serialize};

pub use custom::CustomIdProvider;
pub use guid::{GuidV4Provider, UuidProvider};
pub use object_id::ObjectIdProvider;

/// Smallest byte length a custom provider may use
pub const MIN_CUSTOM_ID_LENGTH: usize = 1;

/// Largest byte length a custom provider may use
pub const MAX_CUSTOM_ID_LENGTH: usize = 255;

/// Capability set shared by every identifier provider
pub trait IdentifierProvider {
    /// Width of every identifier this provider produces
    fn byte_length(&self) -> usize;

    /// Produce a fresh identifier of exactly `byte_length()` bytes
    fn generate(&self) -> Vec<u8>;

    /// Check length and, where the format has one, internal structure
    fn validate(&self, id: &[u8]) -> bool;

    /// Canonical text form of a valid identifier
    fn id_to_string(&self, id: &[u8]) -> Result<String>;

    /// Parse the canonical text form back to bytes
    fn id_from_string(&self, text: &str) -> Result<Vec<u8>>;
}

/// Closed set of provider variants carried by the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdProvider {
    ObjectId,
    GuidV4,
    Uuid,
    Custom { byte_length: usize },
}

impl Default for IdProvider {
    fn default() -> Self {
        IdProvider::ObjectId
    }
}

impl IdProvider {
    /// Custom provider with a validated byte length
    pub fn custom(byte_length: usize) -> Result<Self> {
        CustomIdProvider::new(byte_length)?;
        Ok(IdProvider::Custom { byte_length })
    }

    /// Short name used in logs and CLI output
    pub fn name(&self) -> &'static str {
        match self {
            IdProvider::ObjectId => "object_id",
            IdProvider::GuidV4 => "guid_v4",
            IdProvider::Uuid => "uuid",
            IdProvider::Custom { .. } => "custom",
        }
    }

    fn custom_provider(byte_length: usize) -> Result<CustomIdProvider> {
        CustomIdProvider::new(byte_length)
    }
}

impl IdentifierProvider for IdProvider {
    fn byte_length(&self) -> usize {
        match self {
            IdProvider::ObjectId => ObjectIdProvider.byte_length(),
            IdProvider::GuidV4 => GuidV4Provider.byte_length(),
            IdProvider::Uuid => UuidProvider.byte_length(),
            IdProvider::Custom { byte_length } => *byte_length,
        }
    }

    fn generate(&self) -> Vec<u8> {
        match self {
            IdProvider::ObjectId => ObjectIdProvider.generate(),
            IdProvider::GuidV4 => GuidV4Provider.generate(),
            IdProvider::Uuid => UuidProvider.generate(),
            // Out-of-range lengths never survive config validation; clamp so
            // generate() stays total.
            IdProvider::Custom { byte_length } => {
                CustomIdProvider::clamped(*byte_length).generate()
            }
        }
    }

    fn validate(&self, id: &[u8]) -> bool {
        match self {
            IdProvider::ObjectId => ObjectIdProvider.validate(id),
            IdProvider::GuidV4 => GuidV4Provider.validate(id),
            IdProvider::Uuid => UuidProvider.validate(id),
            IdProvider::Custom { byte_length } => Self::custom_provider(*byte_length)
                .map(|p| p.validate(id))
                .unwrap_or(false),
        }
    }

    fn id_to_string(&self, id: &[u8]) -> Result<String> {
        match self {
            IdProvider::ObjectId => ObjectIdProvider.id_to_string(id),
            IdProvider::GuidV4 => GuidV4Provider.id_to_string(id),
            IdProvider::Uuid => UuidProvider.id_to_string(id),
            IdProvider::Custom { byte_length } => {
                Self::custom_provider(*byte_length)?.id_to_string(id)
            }
        }
    }

    fn id_from_string(&self, text: &str) -> Result<Vec<u8>> {
        match self {
            IdProvider::ObjectId => ObjectIdProvider.id_from_string(text),
            IdProvider::GuidV4 => GuidV4Provider.id_from_string(text),
            IdProvider::Uuid => UuidProvider.id_from_string(text),
            IdProvider::Custom { byte_length } => {
                Self::custom_provider(*byte_length)?.id_from_string(text)
            }
        }
    }
}

/// Shared length check used by every provider
pub(crate) fn ensure_length(id: &[u8], expected: usize, provider: &str) -> Result<()> {
    if id.len() != expected {
        return Err(EciesError::InvalidIdentifier(format!(
            "{} identifier must be {} bytes, got {}",
            provider,
            expected,
            id.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_lengths() {
        assert_eq!(IdProvider::ObjectId.byte_length(), 12);
        assert_eq!(IdProvider::GuidV4.byte_length(), 16);
        assert_eq!(IdProvider::Uuid.byte_length(), 16);
        assert_eq!(IdProvider::custom(20).unwrap().byte_length(), 20);
    }

    #[test]
    fn test_custom_length_bounds() {
        assert!(IdProvider::custom(0).is_err());
        assert!(IdProvider::custom(1).is_ok());
        assert!(IdProvider::custom(255).is_ok());
        assert!(matches!(
            IdProvider::custom(256),
            Err(EciesError::InvalidProviderLength(256))
        ));
    }

    #[test]
    fn test_every_variant_roundtrips_text() {
        let providers = [
            IdProvider::ObjectId,
            IdProvider::GuidV4,
            IdProvider::Uuid,
            IdProvider::custom(7).unwrap(),
        ];

        for provider in providers {
            let id = provider.generate();
            assert_eq!(id.len(), provider.byte_length());
            assert!(provider.validate(&id), "{} id should validate", provider.name());

            let text = provider.id_to_string(&id).unwrap();
            let parsed = provider.id_from_string(&text).unwrap();
            assert_eq!(parsed, id, "{} text roundtrip", provider.name());
        }
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(IdProvider::Custom { byte_length: 20 }).unwrap();
        assert_eq!(json, serde_json::json!({ "custom": { "byte_length": 20 } }));

        let json = serde_json::to_value(IdProvider::GuidV4).unwrap();
        assert_eq!(json, serde_json::json!("guid_v4"));

        let parsed: IdProvider = serde_json::from_value(serde_json::json!("object_id")).unwrap();
        assert_eq!(parsed, IdProvider::ObjectId);
    }
}
