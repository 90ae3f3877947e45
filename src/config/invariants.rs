// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration invariant battery
//!
//! Each check appends to one list; nothing short-circuits, so a caller sees
//! every problem with a configuration at once.

use super::{ConfigValues, MAX_STREAM_CHUNK_SIZE, SUPPORTED_CURVES};
use crate::crypto::ecdh::RAW_PUBLIC_KEY_SIZE;
use crate::error::InvariantViolation;
use crate::identifiers::{IdProvider, IdentifierProvider, MAX_CUSTOM_ID_LENGTH, MIN_CUSTOM_ID_LENGTH};
use regex::Regex;
use std::sync::OnceLock;

/// Only AES-256-class ciphers are supported
pub const REQUIRED_SYMMETRIC_KEY_SIZE: usize = 32;
/// AES-GCM IV size used on the wire
pub const REQUIRED_IV_SIZE: usize = 16;
/// AES-GCM tag size
pub const REQUIRED_AUTH_TAG_SIZE: usize = 16;
/// Width of the recipient count field (u16)
pub const REQUIRED_RECIPIENT_COUNT_SIZE: usize = 2;
/// Width of the single-mode length field (u64)
pub const REQUIRED_DATA_LENGTH_SIZE: usize = 8;

pub const PBKDF2_MIN_ITERATIONS: u32 = 1_000;
pub const PBKDF2_MAX_ITERATIONS: u32 = 10_000_000;
pub const PBKDF2_MIN_SALT_BYTES: usize = 16;
pub const PBKDF2_MAX_SALT_BYTES: usize = 256;
pub const PBKDF2_MIN_HASH_BYTES: usize = 16;
pub const PBKDF2_MAX_HASH_BYTES: usize = 64;

/// Raw (x ‖ y) public key width the engine writes for a supported curve
fn curve_raw_public_key_length(curve: &str) -> Option<usize> {
    match curve {
        "secp256k1" => Some(RAW_PUBLIC_KEY_SIZE),
        _ => None,
    }
}

fn derivation_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^m(/[0-9]+'?)+$").expect("derivation path regex is valid"))
}

/// Run every invariant and return all violations (empty = valid)
pub fn check_invariants(values: &ConfigValues) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    check_recipient_ids(values, &mut violations);
    check_algorithm(values, &mut violations);
    check_profiles(values, &mut violations);
    check_frame_sizes(values, &mut violations);
    check_stream(values, &mut violations);
    violations
}

fn check_recipient_ids(values: &ConfigValues, out: &mut Vec<InvariantViolation>) {
    if let IdProvider::Custom { byte_length } = values.id_provider {
        if !(MIN_CUSTOM_ID_LENGTH..=MAX_CUSTOM_ID_LENGTH).contains(&byte_length) {
            out.push(InvariantViolation::new(
                "recipient_id.provider",
                format!("custom identifier length {} outside 1-255", byte_length),
            ));
        }
    }

    let provider_len = values.id_provider.byte_length();
    let member = values.member_id_length;
    let recipient = values.multiple.recipient_id_size;
    if member != provider_len || recipient != provider_len {
        out.push(InvariantViolation::new(
            "recipient_id.consistency",
            format!(
                "member_id_length ({}), multiple.recipient_id_size ({}) and {} provider length ({}) must be equal",
                member,
                recipient,
                values.id_provider.name(),
                provider_len
            ),
        ));
    }
}

fn check_algorithm(values: &ConfigValues, out: &mut Vec<InvariantViolation>) {
    if !SUPPORTED_CURVES.contains(&values.curve_name.as_str()) {
        out.push(InvariantViolation::new(
            "algorithm.curve",
            format!(
                "unsupported curve '{}' (supported: {})",
                values.curve_name,
                SUPPORTED_CURVES.join(", ")
            ),
        ));
    }

    // The remaining key widths are tied to the raw length in check_frame_sizes
    if let Some(expected) = curve_raw_public_key_length(&values.curve_name) {
        let raw = values.public_key.raw_public_key_length;
        if raw != expected {
            out.push(InvariantViolation::new(
                "algorithm.public_key_size",
                format!(
                    "raw_public_key_length {} bytes, {} keys are {}",
                    raw, values.curve_name, expected
                ),
            ));
        }
    }

    let symmetric = &values.symmetric;
    if symmetric.key_size != REQUIRED_SYMMETRIC_KEY_SIZE {
        out.push(InvariantViolation::new(
            "algorithm.key_size",
            format!(
                "symmetric key size {} bytes, expected {}",
                symmetric.key_size, REQUIRED_SYMMETRIC_KEY_SIZE
            ),
        ));
    }
    if symmetric.key_bits != symmetric.key_size * 8 {
        out.push(InvariantViolation::new(
            "algorithm.key_bits",
            format!(
                "key_bits {} does not match key_size {} bytes",
                symmetric.key_bits, symmetric.key_size
            ),
        ));
    }
    if symmetric.algorithm != "aes" || symmetric.mode != "gcm" {
        out.push(InvariantViolation::new(
            "algorithm.cipher",
            format!(
                "unsupported cipher {}-{} (only aes-gcm)",
                symmetric.algorithm, symmetric.mode
            ),
        ));
    }
    if values.iv_size != REQUIRED_IV_SIZE {
        out.push(InvariantViolation::new(
            "algorithm.iv_size",
            format!("iv_size {} bytes, expected {}", values.iv_size, REQUIRED_IV_SIZE),
        ));
    }
    if values.auth_tag_size != REQUIRED_AUTH_TAG_SIZE {
        out.push(InvariantViolation::new(
            "algorithm.auth_tag_size",
            format!(
                "auth_tag_size {} bytes, expected {}",
                values.auth_tag_size, REQUIRED_AUTH_TAG_SIZE
            ),
        ));
    }

    if let Some(path) = &values.primary_key_derivation_path {
        if !derivation_path_regex().is_match(path) {
            out.push(InvariantViolation::new(
                "algorithm.derivation_path",
                format!("'{}' is not a valid derivation path", path),
            ));
        }
    }
}

fn check_profiles(values: &ConfigValues, out: &mut Vec<InvariantViolation>) {
    for (name, profile) in &values.pbkdf2_profiles {
        if !(PBKDF2_MIN_ITERATIONS..=PBKDF2_MAX_ITERATIONS).contains(&profile.iterations) {
            out.push(InvariantViolation::new(
                "profile.iterations",
                format!(
                    "profile '{}': iterations {} outside [{}, {}]",
                    name, profile.iterations, PBKDF2_MIN_ITERATIONS, PBKDF2_MAX_ITERATIONS
                ),
            ));
        }
        if !(PBKDF2_MIN_SALT_BYTES..=PBKDF2_MAX_SALT_BYTES).contains(&profile.salt_bytes) {
            out.push(InvariantViolation::new(
                "profile.salt_bytes",
                format!(
                    "profile '{}': salt {} bytes outside [{}, {}]",
                    name, profile.salt_bytes, PBKDF2_MIN_SALT_BYTES, PBKDF2_MAX_SALT_BYTES
                ),
            ));
        }
        if !(PBKDF2_MIN_HASH_BYTES..=PBKDF2_MAX_HASH_BYTES).contains(&profile.hash_bytes) {
            out.push(InvariantViolation::new(
                "profile.hash_bytes",
                format!(
                    "profile '{}': output {} bytes outside [{}, {}]",
                    name, profile.hash_bytes, PBKDF2_MIN_HASH_BYTES, PBKDF2_MAX_HASH_BYTES
                ),
            ));
        }
    }
}

fn check_frame_sizes(values: &ConfigValues, out: &mut Vec<InvariantViolation>) {
    let pk = &values.public_key;
    if pk.public_key_length != pk.raw_public_key_length + 1 {
        out.push(InvariantViolation::new(
            "frame.public_key_length",
            format!(
                "public_key_length {} != raw_public_key_length {} + 1",
                pk.public_key_length, pk.raw_public_key_length
            ),
        ));
    }
    if pk.compressed_public_key_length != pk.raw_public_key_length / 2 + 1 {
        out.push(InvariantViolation::new(
            "frame.compressed_public_key_length",
            format!(
                "compressed_public_key_length {} != raw_public_key_length / 2 + 1",
                pk.compressed_public_key_length
            ),
        ));
    }

    let multiple = &values.multiple;
    let expected_wrapped =
        pk.public_key_length + values.iv_size + values.auth_tag_size + values.symmetric.key_size;
    if multiple.encrypted_key_size != expected_wrapped {
        out.push(InvariantViolation::new(
            "frame.encrypted_key_size",
            format!(
                "encrypted_key_size {} != public key {} + iv {} + tag {} + key {} ({})",
                multiple.encrypted_key_size,
                pk.public_key_length,
                values.iv_size,
                values.auth_tag_size,
                values.symmetric.key_size,
                expected_wrapped
            ),
        ));
    }
    if multiple.recipient_count_size != REQUIRED_RECIPIENT_COUNT_SIZE {
        out.push(InvariantViolation::new(
            "frame.recipient_count_size",
            format!(
                "recipient_count_size {} bytes, the count field is a u16 ({} bytes)",
                multiple.recipient_count_size, REQUIRED_RECIPIENT_COUNT_SIZE
            ),
        ));
    }
    if multiple.max_recipients == 0 || multiple.max_recipients > u16::MAX as usize {
        out.push(InvariantViolation::new(
            "frame.max_recipients",
            format!(
                "max_recipients {} outside [1, {}]",
                multiple.max_recipients,
                u16::MAX
            ),
        ));
    }
    if values.single.data_length_size != REQUIRED_DATA_LENGTH_SIZE {
        out.push(InvariantViolation::new(
            "frame.data_length_size",
            format!(
                "data_length_size {} bytes, expected {}",
                values.single.data_length_size, REQUIRED_DATA_LENGTH_SIZE
            ),
        ));
    }

    let simple_expected =
        1 + pk.compressed_public_key_length + values.iv_size + values.auth_tag_size;
    let overheads = [
        ("frame.simple_overhead", values.simple.fixed_overhead_size, simple_expected),
        (
            "frame.single_overhead",
            values.single.fixed_overhead_size,
            simple_expected + values.single.data_length_size,
        ),
        (
            "frame.multiple_overhead",
            multiple.fixed_overhead_size,
            simple_expected + multiple.recipient_count_size,
        ),
    ];
    for (invariant, declared, expected) in overheads {
        if declared != expected {
            out.push(InvariantViolation::new(
                invariant,
                format!("fixed_overhead_size {} != computed {}", declared, expected),
            ));
        }
    }
}

fn check_stream(values: &ConfigValues, out: &mut Vec<InvariantViolation>) {
    let stream = &values.stream;
    if stream.chunk_size == 0
        || stream.chunk_size > stream.max_chunk_size
        || stream.max_chunk_size > MAX_STREAM_CHUNK_SIZE
    {
        out.push(InvariantViolation::new(
            "stream.chunk_size",
            format!(
                "need 1 <= chunk_size ({}) <= max_chunk_size ({}) <= {}",
                stream.chunk_size, stream.max_chunk_size, MAX_STREAM_CHUNK_SIZE
            ),
        ));
    }
}
