// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECIES Error Types
//!
//! One error enum for every engine operation. Variants fall into a small
//! taxonomy (see [`ErrorKind`]) and each carries a stable, language-neutral
//! code so presentation layers can localise without parsing messages.
//!
//! ## Error Kinds
//!
//! - **Validation**: malformed length fields, unknown type tags, bad headers,
//!   configuration invariant violations
//! - **Authentication**: any AEAD failure. Always the single opaque
//!   `DecryptionFailed` variant so callers cannot tell a wrong recipient from
//!   a tampered header or corrupted ciphertext
//! - **Capacity**: too many recipients, lengths beyond the safe ceiling
//! - **Provider**: identifier generation or parsing failures
//! - **Io / Cancelled / Disposed**: streaming and secure-buffer lifecycle

use std::fmt;
use thiserror::Error;

/// Broad classification of an [`EciesError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Capacity,
    Provider,
    Io,
    Cancelled,
    Disposed,
}

/// A single failed configuration invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Name of the invariant family, e.g. `algorithm.key_size`
    pub invariant: &'static str,
    /// Human-readable description of what was wrong
    pub message: String,
}

impl InvariantViolation {
    pub fn new(invariant: &'static str, message: impl Into<String>) -> Self {
        Self {
            invariant,
            message: message.into(),
        }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.invariant, self.message)
    }
}

fn join_violations(violations: &[InvariantViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors produced by the ECIES engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EciesError {
    /// Every invariant that failed during a configuration build
    #[error("Invalid configuration ({} violations): {}", .violations.len(), join_violations(.violations))]
    InvalidConfiguration { violations: Vec<InvariantViolation> },

    /// Override document could not be merged or deserialized
    #[error("Invalid configuration override: {0}")]
    InvalidOverride(String),

    /// Attempt to overwrite or remove the reserved default registry key
    #[error("Configuration key '{0}' is reserved")]
    ReservedConfigKey(String),

    /// Buffer ended before the declared length (or length field) was available
    #[error("Length too short: needed {needed} bytes, {available} available")]
    LengthTooShort { needed: u64, available: u64 },

    /// Declared length exceeds the safe-integer ceiling or a configured bound
    #[error("Length too long: {length} exceeds maximum {max}")]
    LengthTooLong { length: u64, max: u64 },

    /// Unrecognised length-prefix width tag
    #[error("Invalid length encoding type: {0:#04x}")]
    LengthInvalidType(u8),

    /// Unknown message type tag
    #[error("Unsupported encryption type: {0}")]
    UnsupportedEncryptionType(u8),

    /// Header is structurally invalid (truncated, duplicate IDs, bad counts)
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// Key has the wrong size or is not a valid curve point / scalar
    #[error("Invalid key ({key_type}): {reason}")]
    InvalidKey { key_type: String, reason: String },

    /// Opaque AEAD failure
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Encryption primitive refused the input (should not happen with valid keys)
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Signature did not verify or was malformed
    #[error("Invalid signature")]
    InvalidSignature,

    /// The caller's recipient ID is not listed in the header
    #[error("Recipient not found in header")]
    RecipientNotFound,

    /// Encrypt was asked to address nobody
    #[error("At least one recipient is required")]
    NoRecipients,

    /// Same recipient ID listed twice
    #[error("Duplicate recipient ID: {0}")]
    DuplicateRecipient(String),

    /// Recipient count exceeds the configured maximum
    #[error("Too many recipients: {count} exceeds maximum {max}")]
    TooManyRecipients { count: usize, max: usize },

    /// Identifier bytes or text rejected by the provider
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Custom provider byte length outside 1..=255
    #[error("Invalid identifier length: {0} (must be 1-255)")]
    InvalidProviderLength(usize),

    /// Stream ended before the final chunk, or a chunk was cut short
    #[error("Stream truncated: {0}")]
    StreamTruncated(String),

    /// Chunk sequence number did not match the expected index
    #[error("Chunk out of sequence: expected {expected}, got {actual}")]
    ChunkOutOfSequence { expected: u32, actual: u32 },

    /// Bytes present after the final chunk
    #[error("Trailing data after final chunk")]
    TrailingData,

    /// Streaming operation was cancelled between chunks
    #[error("Operation cancelled")]
    Cancelled,

    /// Secure buffer used after dispose()
    #[error("Secure buffer has been disposed")]
    SecureBufferDisposed,

    /// Secure string contents are not valid UTF-8
    #[error("Secure string is not valid UTF-8")]
    SecureStringEncoding,

    /// Underlying reader or writer failed
    #[error("IO error: {0}")]
    Io(String),
}

impl EciesError {
    /// Taxonomy bucket for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EciesError::InvalidConfiguration { .. }
            | EciesError::InvalidOverride(_)
            | EciesError::ReservedConfigKey(_)
            | EciesError::LengthTooShort { .. }
            | EciesError::LengthInvalidType(_)
            | EciesError::UnsupportedEncryptionType(_)
            | EciesError::MalformedHeader(_)
            | EciesError::InvalidKey { .. }
            | EciesError::EncryptionFailed(_)
            | EciesError::RecipientNotFound
            | EciesError::NoRecipients
            | EciesError::DuplicateRecipient(_)
            | EciesError::StreamTruncated(_)
            | EciesError::ChunkOutOfSequence { .. }
            | EciesError::TrailingData
            | EciesError::SecureStringEncoding => ErrorKind::Validation,
            EciesError::DecryptionFailed | EciesError::InvalidSignature => {
                ErrorKind::Authentication
            }
            EciesError::LengthTooLong { .. } | EciesError::TooManyRecipients { .. } => {
                ErrorKind::Capacity
            }
            EciesError::InvalidIdentifier(_) | EciesError::InvalidProviderLength(_) => {
                ErrorKind::Provider
            }
            EciesError::Io(_) => ErrorKind::Io,
            EciesError::Cancelled => ErrorKind::Cancelled,
            EciesError::SecureBufferDisposed => ErrorKind::Disposed,
        }
    }

    /// Stable error code, suitable for lookup tables in a presentation layer
    pub fn code(&self) -> &'static str {
        match self {
            EciesError::InvalidConfiguration { .. } => "CONFIG_INVALID",
            EciesError::InvalidOverride(_) => "CONFIG_OVERRIDE_INVALID",
            EciesError::ReservedConfigKey(_) => "CONFIG_KEY_RESERVED",
            EciesError::LengthTooShort { .. } => "LENGTH_TOO_SHORT",
            EciesError::LengthTooLong { .. } => "LENGTH_TOO_LONG",
            EciesError::LengthInvalidType(_) => "LENGTH_INVALID_TYPE",
            EciesError::UnsupportedEncryptionType(_) => "ENCRYPTION_TYPE_UNSUPPORTED",
            EciesError::MalformedHeader(_) => "HEADER_MALFORMED",
            EciesError::InvalidKey { .. } => "KEY_INVALID",
            EciesError::DecryptionFailed => "DECRYPTION_FAILED",
            EciesError::EncryptionFailed(_) => "ENCRYPTION_FAILED",
            EciesError::InvalidSignature => "SIGNATURE_INVALID",
            EciesError::RecipientNotFound => "RECIPIENT_NOT_FOUND",
            EciesError::NoRecipients => "RECIPIENTS_EMPTY",
            EciesError::DuplicateRecipient(_) => "RECIPIENT_DUPLICATE",
            EciesError::TooManyRecipients { .. } => "RECIPIENTS_TOO_MANY",
            EciesError::InvalidIdentifier(_) => "IDENTIFIER_INVALID",
            EciesError::InvalidProviderLength(_) => "IDENTIFIER_LENGTH_INVALID",
            EciesError::StreamTruncated(_) => "STREAM_TRUNCATED",
            EciesError::ChunkOutOfSequence { .. } => "STREAM_CHUNK_SEQUENCE",
            EciesError::TrailingData => "STREAM_TRAILING_DATA",
            EciesError::Cancelled => "CANCELLED",
            EciesError::SecureBufferDisposed => "SECURE_BUFFER_DISPOSED",
            EciesError::SecureStringEncoding => "SECURE_STRING_ENCODING",
            EciesError::Io(_) => "IO",
        }
    }

    pub(crate) fn invalid_key(key_type: &str, reason: impl Into<String>) -> Self {
        EciesError::InvalidKey {
            key_type: key_type.to_string(),
            reason: reason.into(),
        }
    }
}

// Conversion from IO errors (streaming readers/writers)
impl From<std::io::Error> for EciesError {
    fn from(err: std::io::Error) -> Self {
        EciesError::Io(err.to_string())
    }
}

/// Result type alias for ECIES operations
pub type Result<T> = std::result::Result<T, EciesError>;
