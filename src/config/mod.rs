// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECIES Configuration & Invariants
//!
//! Every size the wire format depends on lives here: ID width, key sizes,
//! per-mode overheads. They are derived from each other, so a configuration
//! is only ever handed out after the full invariant battery in
//! [`invariants`] has passed. Builds are override-merges onto a base:
//!
//! ```rust
//! use fabstir_ecies::config::EciesConfig;
//! use serde_json::json;
//!
//! let config = EciesConfig::build(Some(&json!({
//!     "stream": { "chunk_size": 65536 }
//! })))
//! .unwrap();
//! assert_eq!(config.stream().chunk_size, 65536);
//! assert_eq!(config.iv_size(), 16); // everything else from the default
//! ```
//!
//! ## Merge Rules
//!
//! - Objects merge key by key, recursively
//! - Scalars and arrays replace wholesale (`null` clears an optional field)
//! - Unknown keys are rejected
//!
//! ## Immutability
//!
//! [`EciesConfig`] has no setters. Deserializing one runs the same validation
//! as [`EciesConfig::build`], so there is no way to obtain an unchecked
//! instance. Share it behind `Arc` (see [`registry::ConfigRegistry`]).

pub mod invariants;
pub mod profiles;
pub mod registry;

use crate::error::{EciesError, Result};
use crate::identifiers::{IdProvider, IdentifierProvider};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub use invariants::check_invariants;
pub use profiles::Pbkdf2Profile;
pub use registry::{ConfigRegistry, DEFAULT_CONFIG_KEY};

/// Curves this engine can drive (k256 backs secp256k1)
pub const SUPPORTED_CURVES: &[&str] = &["secp256k1"];

/// Default BIP44 path for the primary key (validated, never used for derivation here)
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// Upper bound on stream chunk size; keeps the streaming working set small
pub const MAX_STREAM_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Symmetric cipher parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymmetricConfig {
    pub algorithm: String,
    pub mode: String,
    pub key_bits: usize,
    pub key_size: usize,
}

/// Public key encodings on the configured curve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublicKeyConfig {
    /// x ‖ y without prefix
    pub raw_public_key_length: usize,
    /// 0x04 ‖ x ‖ y
    pub public_key_length: usize,
    /// parity ‖ x
    pub compressed_public_key_length: usize,
    /// Prefix of the uncompressed form
    pub public_key_magic: u8,
}

/// Sizes for the "simple" mode (no length field)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimpleModeConfig {
    pub fixed_overhead_size: usize,
}

/// Sizes for the "single" mode (explicit plaintext length)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SingleModeConfig {
    pub fixed_overhead_size: usize,
    pub data_length_size: usize,
}

/// Sizes for the multi-recipient mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MultipleModeConfig {
    pub fixed_overhead_size: usize,
    pub encrypted_key_size: usize,
    pub recipient_id_size: usize,
    pub recipient_count_size: usize,
    pub max_recipients: usize,
}

/// Streaming chunk parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    pub chunk_size: usize,
    pub max_chunk_size: usize,
}

/// Plain, unvalidated configuration document
///
/// This is the shape overrides are merged into. It only becomes an
/// [`EciesConfig`] through validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigValues {
    pub curve_name: String,
    pub primary_key_derivation_path: Option<String>,
    pub symmetric: SymmetricConfig,
    pub iv_size: usize,
    pub auth_tag_size: usize,
    pub public_key: PublicKeyConfig,
    pub simple: SimpleModeConfig,
    pub single: SingleModeConfig,
    pub multiple: MultipleModeConfig,
    pub member_id_length: usize,
    pub id_provider: IdProvider,
    pub pbkdf2_profiles: BTreeMap<String, Pbkdf2Profile>,
    pub stream: StreamConfig,
}

impl Default for ConfigValues {
    fn default() -> Self {
        let id_size = IdProvider::ObjectId.byte_length();
        let compressed = 33;
        let iv_size = 16;
        let tag_size = 16;
        let simple_overhead = 1 + compressed + iv_size + tag_size;

        Self {
            curve_name: "secp256k1".to_string(),
            primary_key_derivation_path: Some(DEFAULT_DERIVATION_PATH.to_string()),
            symmetric: SymmetricConfig {
                algorithm: "aes".to_string(),
                mode: "gcm".to_string(),
                key_bits: 256,
                key_size: 32,
            },
            iv_size,
            auth_tag_size: tag_size,
            public_key: PublicKeyConfig {
                raw_public_key_length: 64,
                public_key_length: 65,
                compressed_public_key_length: compressed,
                public_key_magic: 0x04,
            },
            simple: SimpleModeConfig {
                fixed_overhead_size: simple_overhead,
            },
            single: SingleModeConfig {
                fixed_overhead_size: simple_overhead + 8,
                data_length_size: 8,
            },
            multiple: MultipleModeConfig {
                fixed_overhead_size: simple_overhead + 2,
                encrypted_key_size: 65 + iv_size + tag_size + 32,
                recipient_id_size: id_size,
                recipient_count_size: 2,
                max_recipients: u16::MAX as usize,
            },
            member_id_length: id_size,
            id_provider: IdProvider::ObjectId,
            pbkdf2_profiles: profiles::default_profiles(),
            stream: StreamConfig {
                chunk_size: 1024 * 1024,
                max_chunk_size: MAX_STREAM_CHUNK_SIZE,
            },
        }
    }
}

/// Validated, immutable ECIES configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConfigValues", into = "ConfigValues")]
pub struct EciesConfig {
    values: ConfigValues,
}

impl TryFrom<ConfigValues> for EciesConfig {
    type Error = EciesError;

    fn try_from(values: ConfigValues) -> Result<Self> {
        let violations = check_invariants(&values);
        if !violations.is_empty() {
            warn!(
                violations = violations.len(),
                "❌ Configuration rejected by invariant checks"
            );
            return Err(EciesError::InvalidConfiguration { violations });
        }
        Ok(Self { values })
    }
}

impl From<EciesConfig> for ConfigValues {
    fn from(config: EciesConfig) -> Self {
        config.values
    }
}

impl Default for EciesConfig {
    fn default() -> Self {
        // The default document satisfies every invariant (see tests).
        Self {
            values: ConfigValues::default(),
        }
    }
}

impl EciesConfig {
    /// Build from the default configuration plus optional overrides
    pub fn build(overrides: Option<&Value>) -> Result<Self> {
        Self::build_from(&EciesConfig::default(), overrides)
    }

    /// Build from an existing configuration plus optional overrides
    pub fn build_from(base: &EciesConfig, overrides: Option<&Value>) -> Result<Self> {
        let Some(overrides) = overrides else {
            return Ok(base.clone());
        };
        if !overrides.is_object() {
            return Err(EciesError::InvalidOverride(
                "overrides must be a JSON object".to_string(),
            ));
        }

        let mut merged = serde_json::to_value(&base.values)
            .map_err(|e| EciesError::InvalidOverride(e.to_string()))?;
        deep_merge(&mut merged, overrides);

        let values: ConfigValues = serde_json::from_value(merged)
            .map_err(|e| EciesError::InvalidOverride(e.to_string()))?;

        let config = EciesConfig::try_from(values)?;
        debug!(
            id_provider = config.values.id_provider.name(),
            recipient_id_size = config.values.multiple.recipient_id_size,
            "Configuration built from overrides"
        );
        Ok(config)
    }

    /// Default configuration re-sized for a different identifier provider
    ///
    /// Changing only `id_provider` would (correctly) fail the recipient-ID
    /// consistency invariant; this aligns all three ID sizes at once.
    pub fn for_id_provider(provider: IdProvider) -> Result<Self> {
        let size = provider.byte_length();
        let overrides = serde_json::json!({
            "id_provider": provider,
            "member_id_length": size,
            "multiple": { "recipient_id_size": size },
        });
        Self::build(Some(&overrides))
    }

    /// Plain copy of the underlying document (e.g. to serialize or re-merge)
    pub fn values(&self) -> &ConfigValues {
        &self.values
    }

    pub fn curve_name(&self) -> &str {
        &self.values.curve_name
    }

    pub fn primary_key_derivation_path(&self) -> Option<&str> {
        self.values.primary_key_derivation_path.as_deref()
    }

    pub fn symmetric(&self) -> &SymmetricConfig {
        &self.values.symmetric
    }

    pub fn key_size(&self) -> usize {
        self.values.symmetric.key_size
    }

    pub fn iv_size(&self) -> usize {
        self.values.iv_size
    }

    pub fn auth_tag_size(&self) -> usize {
        self.values.auth_tag_size
    }

    pub fn public_key(&self) -> &PublicKeyConfig {
        &self.values.public_key
    }

    pub fn simple(&self) -> &SimpleModeConfig {
        &self.values.simple
    }

    pub fn single(&self) -> &SingleModeConfig {
        &self.values.single
    }

    pub fn multiple(&self) -> &MultipleModeConfig {
        &self.values.multiple
    }

    pub fn member_id_length(&self) -> usize {
        self.values.member_id_length
    }

    pub fn id_provider(&self) -> &IdProvider {
        &self.values.id_provider
    }

    pub fn pbkdf2_profiles(&self) -> &BTreeMap<String, Pbkdf2Profile> {
        &self.values.pbkdf2_profiles
    }

    pub fn pbkdf2_profile(&self, name: &str) -> Option<&Pbkdf2Profile> {
        self.values.pbkdf2_profiles.get(name)
    }

    pub fn stream(&self) -> &StreamConfig {
        &self.values.stream
    }
}

/// Recursive plain-structure merge: objects key by key, everything else replaced
pub fn deep_merge(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            for (key, value) in override_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}
