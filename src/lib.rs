// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod crypto;
pub mod ecies;
pub mod error;
pub mod frame;
pub mod identifiers;
pub mod streaming;
pub mod version;

// Re-export main types
pub use config::{ConfigRegistry, EciesConfig, DEFAULT_CONFIG_KEY};
pub use crypto::{EciesKeyPair, SecureBuffer, SecureString};
pub use ecies::{Ecies, Recipient};
pub use error::{EciesError, ErrorKind, Result};
pub use frame::{EncryptionMode, MessageHeader};
pub use identifiers::{IdProvider, IdentifierProvider};
pub use streaming::{StreamOptions, StreamProgress, StreamSummary};
