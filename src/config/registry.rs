// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Named Configuration Registry
//!
//! Holds validated configurations under caller-chosen names. Entries are
//! `Arc<EciesConfig>` and never change after insertion: registering a name
//! again swaps the map slot (last writer wins), it does not touch the old
//! value that readers may still hold.
//!
//! The registry is an ordinary value: create one per application context and
//! pass it around. [`ConfigRegistry::global`] exists for callers that want a
//! process-wide instance, but nothing in the engine requires it.
//!
//! # Example
//!
//! ```ignore
//! let registry = ConfigRegistry::new();
//! registry.register("guid", &json!({ ... }))?;
//! let config = registry.get("guid");      // registered entry
//! let fallback = registry.get("missing"); // default
//! ```

use super::EciesConfig;
use crate::error::{EciesError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

/// Reserved name of the default configuration
pub const DEFAULT_CONFIG_KEY: &str = "default";

type Entries = HashMap<String, Arc<EciesConfig>>;

/// Thread-safe map of named, validated configurations
#[derive(Clone)]
pub struct ConfigRegistry {
    default: Arc<EciesConfig>,
    entries: Arc<RwLock<Entries>>,
}

impl ConfigRegistry {
    /// Registry whose default is [`EciesConfig::default`]
    pub fn new() -> Self {
        Self::with_default(EciesConfig::default())
    }

    /// Registry with a caller-supplied default
    pub fn with_default(default: EciesConfig) -> Self {
        Self {
            default: Arc::new(default),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Process-wide registry, created on first use
    pub fn global() -> &'static ConfigRegistry {
        static GLOBAL: OnceLock<ConfigRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ConfigRegistry::new)
    }

    // Entries are immutable Arcs, so a poisoned lock still holds a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_not_reserved(key: &str) -> Result<()> {
        if key == DEFAULT_CONFIG_KEY {
            return Err(EciesError::ReservedConfigKey(key.to_string()));
        }
        Ok(())
    }

    /// Build `overrides` on top of the default and store under `key`
    pub fn register(&self, key: &str, overrides: &Value) -> Result<Arc<EciesConfig>> {
        Self::ensure_not_reserved(key)?;
        let config = EciesConfig::build_from(&self.default, Some(overrides))?;
        Ok(self.insert(key, config))
    }

    /// Build `overrides` on top of another named configuration
    pub fn register_derived(
        &self,
        key: &str,
        base_key: &str,
        overrides: &Value,
    ) -> Result<Arc<EciesConfig>> {
        Self::ensure_not_reserved(key)?;
        let base = self.get(base_key);
        let config = EciesConfig::build_from(&base, Some(overrides))?;
        Ok(self.insert(key, config))
    }

    /// Store an already-built configuration
    pub fn register_config(&self, key: &str, config: EciesConfig) -> Result<Arc<EciesConfig>> {
        Self::ensure_not_reserved(key)?;
        Ok(self.insert(key, config))
    }

    fn insert(&self, key: &str, config: EciesConfig) -> Arc<EciesConfig> {
        let config = Arc::new(config);
        let mut entries = self.write();
        let replaced = entries.insert(key.to_string(), config.clone()).is_some();
        info!(
            key,
            replaced,
            total = entries.len(),
            "🔧 Configuration registered"
        );
        config
    }

    /// Configuration under `key`, or the default when the name is unknown
    pub fn get(&self, key: &str) -> Arc<EciesConfig> {
        if key == DEFAULT_CONFIG_KEY {
            return self.default.clone();
        }
        self.read()
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }

    /// The reserved default configuration
    pub fn default_config(&self) -> Arc<EciesConfig> {
        self.default.clone()
    }

    /// Remove a name; later lookups of it return the default
    ///
    /// Returns whether an entry was removed.
    pub fn unregister(&self, key: &str) -> Result<bool> {
        Self::ensure_not_reserved(key)?;
        let mut entries = self.write();
        let removed = entries.remove(key).is_some();
        if removed {
            info!(key, remaining = entries.len(), "🗑️  Configuration unregistered");
        }
        Ok(removed)
    }

    /// Whether `key` names a registered (non-default) entry
    pub fn contains(&self, key: &str) -> bool {
        key == DEFAULT_CONFIG_KEY || self.read().contains_key(key)
    }

    /// Registered names, sorted, excluding the default
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}
