// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! 12-byte object identifiers
//!
//! Layout follows the common object-ID convention:
//!
//! ```text
//! [timestamp (4 bytes BE seconds) | process random (5 bytes) | counter (3 bytes BE)]
//! ```
//!
//! The process-random part is drawn once per process; the counter starts at a
//! random value and wraps at 2^24.

use super::{ensure_length, IdentifierProvider};
use crate::error::{EciesError, Result};
use chrono::Utc;
use rand::{rngs::OsRng, RngCore};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

/// Width of object identifiers
pub const OBJECT_ID_BYTE_LENGTH: usize = 12;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

struct ProcessState {
    random: [u8; 5],
    counter: AtomicU32,
}

fn process_state() -> &'static ProcessState {
    static STATE: OnceLock<ProcessState> = OnceLock::new();
    STATE.get_or_init(|| {
        let mut random = [0u8; 5];
        OsRng.fill_bytes(&mut random);
        ProcessState {
            random,
            counter: AtomicU32::new(OsRng.next_u32() & COUNTER_MASK),
        }
    })
}

/// Timestamp + process + counter identifiers, hex text form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectIdProvider;

impl ObjectIdProvider {
    /// Seconds-since-epoch embedded in an object ID
    pub fn timestamp(id: &[u8]) -> Result<u32> {
        ensure_length(id, OBJECT_ID_BYTE_LENGTH, "object_id")?;
        Ok(u32::from_be_bytes([id[0], id[1], id[2], id[3]]))
    }
}

impl IdentifierProvider for ObjectIdProvider {
    fn byte_length(&self) -> usize {
        OBJECT_ID_BYTE_LENGTH
    }

    fn generate(&self) -> Vec<u8> {
        let state = process_state();
        let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let counter = state.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut id = Vec::with_capacity(OBJECT_ID_BYTE_LENGTH);
        id.extend_from_slice(&seconds.to_be_bytes());
        id.extend_from_slice(&state.random);
        id.extend_from_slice(&counter.to_be_bytes()[1..]);
        id
    }

    fn validate(&self, id: &[u8]) -> bool {
        id.len() == OBJECT_ID_BYTE_LENGTH
    }

    fn id_to_string(&self, id: &[u8]) -> Result<String> {
        ensure_length(id, OBJECT_ID_BYTE_LENGTH, "object_id")?;
        Ok(hex::encode(id))
    }

    fn id_from_string(&self, text: &str) -> Result<Vec<u8>> {
        if text.len() != OBJECT_ID_BYTE_LENGTH * 2 {
            return Err(EciesError::InvalidIdentifier(format!(
                "object_id text must be 24 hex characters, got {}",
                text.len()
            )));
        }
        let bytes = hex::decode(text)
            .map_err(|e| EciesError::InvalidIdentifier(format!("invalid hex: {}", e)))?;
        ensure_length(&bytes, OBJECT_ID_BYTE_LENGTH, "object_id")?;
        Ok(bytes)
    }
}
