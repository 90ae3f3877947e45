// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Wire Framing
//!
//! Byte-level encoding shared by the buffer and streaming engines:
//!
//! - [`length`]: self-describing length prefixes (width tag + big-endian value)
//! - [`header`]: message headers for the three buffer modes
//!
//! Decoders here are total: every input either decodes or yields a typed
//! error. Nothing reads past the end of a slice.

pub mod header;
pub mod length;

pub use header::{
    EncryptionMode, HeaderBody, MessageHeader, RecipientEntry, WrappedKey, TYPE_MULTIPLE,
    TYPE_SIMPLE, TYPE_SINGLE, WRAPPED_KEY_SIZE,
};
pub use length::{
    decode_length, decode_length_prefixed, encode_length, encode_length_prefixed, LengthWidth,
    MAX_SAFE_LENGTH,
};

use crate::error::{EciesError, Result};

/// Bounds-checked forward reader over a byte slice
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Next `n` bytes, or `MalformedHeader` naming the missing `field`
    pub(crate) fn take(&mut self, n: usize, field: &str) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(EciesError::MalformedHeader(format!(
                "truncated {}: need {} bytes, {} remain",
                field,
                n,
                self.remaining()
            )));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub(crate) fn take_array<const N: usize>(&mut self, field: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self, field: &str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    pub(crate) fn u16(&mut self, field: &str) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take_array(field)?))
    }

    pub(crate) fn u32(&mut self, field: &str) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take_array(field)?))
    }

    pub(crate) fn u64(&mut self, field: &str) -> Result<u64> {
        Ok(u64::from_be_bytes(self.take_array(field)?))
    }
}
