// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Length-Prefixed Encoding
//!
//! **Format**:
//! ```text
//! [width tag (1 byte) | length (1/2/4/8 bytes BE) | payload (length bytes)]
//! ```
//!
//! | Tag | Width |
//! |-----|-------|
//! | 0   | u8    |
//! | 1   | u16   |
//! | 2   | u32   |
//! | 3   | u64   |
//!
//! The encoder always picks the narrowest width. Lengths above
//! [`MAX_SAFE_LENGTH`] (2^53 - 1) are refused in both directions so peers
//! that store lengths in IEEE doubles never lose precision.

use crate::error::{EciesError, Result};

/// Largest length either side will encode or accept
pub const MAX_SAFE_LENGTH: u64 = (1 << 53) - 1;

/// Width class of a length field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LengthWidth {
    U8 = 0,
    U16 = 1,
    U32 = 2,
    U64 = 3,
}

impl LengthWidth {
    /// Narrowest width that can hold `length`
    pub fn for_length(length: u64) -> Self {
        if length <= u8::MAX as u64 {
            LengthWidth::U8
        } else if length <= u16::MAX as u64 {
            LengthWidth::U16
        } else if length <= u32::MAX as u64 {
            LengthWidth::U32
        } else {
            LengthWidth::U64
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(LengthWidth::U8),
            1 => Ok(LengthWidth::U16),
            2 => Ok(LengthWidth::U32),
            3 => Ok(LengthWidth::U64),
            other => Err(EciesError::LengthInvalidType(other)),
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Bytes taken by the length value (tag excluded)
    pub fn size(self) -> usize {
        match self {
            LengthWidth::U8 => 1,
            LengthWidth::U16 => 2,
            LengthWidth::U32 => 4,
            LengthWidth::U64 => 8,
        }
    }

    /// Decode a length value of this width from exactly `size()` bytes
    pub(crate) fn read_value(self, bytes: &[u8]) -> u64 {
        bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64)
    }
}

fn check_ceiling(length: u64) -> Result<()> {
    if length > MAX_SAFE_LENGTH {
        return Err(EciesError::LengthTooLong {
            length,
            max: MAX_SAFE_LENGTH,
        });
    }
    Ok(())
}

/// Append the tag and length field for `length` to `out`
pub fn encode_length(length: u64, out: &mut Vec<u8>) -> Result<()> {
    check_ceiling(length)?;
    let width = LengthWidth::for_length(length);
    out.push(width.tag());
    out.extend_from_slice(&length.to_be_bytes()[8 - width.size()..]);
    Ok(())
}

/// Tag + length + payload
pub fn encode_length_prefixed(payload: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    encode_length(payload.len() as u64, &mut out)?;
    out.extend_from_slice(payload);
    Ok(out)
}

/// Bytes the prefix for `length` occupies (tag + value)
pub fn prefix_size(length: u64) -> usize {
    1 + LengthWidth::for_length(length).size()
}

/// Decode a length field, returning `(length, bytes consumed)`
pub fn decode_length(input: &[u8]) -> Result<(u64, usize)> {
    let Some(&tag) = input.first() else {
        return Err(EciesError::LengthTooShort {
            needed: 1,
            available: 0,
        });
    };
    let width = LengthWidth::from_tag(tag)?;

    let field_end = 1 + width.size();
    if input.len() < field_end {
        return Err(EciesError::LengthTooShort {
            needed: field_end as u64,
            available: input.len() as u64,
        });
    }

    let length = width.read_value(&input[1..field_end]);
    check_ceiling(length)?;
    Ok((length, field_end))
}

/// Decode a length-prefixed payload, returning `(payload, bytes consumed)`
///
/// Bytes after the payload are left for the caller.
pub fn decode_length_prefixed(input: &[u8]) -> Result<(&[u8], usize)> {
    let (length, offset) = decode_length(input)?;
    let available = (input.len() - offset) as u64;
    if available < length {
        return Err(EciesError::LengthTooShort {
            needed: length,
            available,
        });
    }
    let end = offset + length as usize;
    Ok((&input[offset..end], end))
}
