// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Length prefixes and header parsing against hostile input

use fabstir_ecies::frame::{
    decode_length, decode_length_prefixed, encode_length, encode_length_prefixed, LengthWidth,
    MessageHeader, MAX_SAFE_LENGTH, TYPE_MULTIPLE,
};
use fabstir_ecies::{EciesConfig, EciesError};

fn encoded(length: u64) -> Vec<u8> {
    let mut out = Vec::new();
    encode_length(length, &mut out).unwrap();
    out
}

#[test]
fn test_width_boundaries() {
    let cases: [(u64, LengthWidth); 8] = [
        (0, LengthWidth::U8),
        (255, LengthWidth::U8),
        (256, LengthWidth::U16),
        (65_535, LengthWidth::U16),
        (65_536, LengthWidth::U32),
        (u32::MAX as u64, LengthWidth::U32),
        (u32::MAX as u64 + 1, LengthWidth::U64),
        (MAX_SAFE_LENGTH, LengthWidth::U64),
    ];

    for (length, width) in cases {
        let bytes = encoded(length);
        assert_eq!(bytes[0], width.tag(), "length {}", length);
        assert_eq!(bytes.len(), 1 + width.size());
        assert_eq!(decode_length(&bytes).unwrap(), (length, bytes.len()));
    }
}

#[test]
fn test_ceiling_enforced_both_ways() {
    let mut out = Vec::new();
    assert!(matches!(
        encode_length(MAX_SAFE_LENGTH + 1, &mut out),
        Err(EciesError::LengthTooLong { .. })
    ));
    assert!(out.is_empty());

    let mut over = vec![3u8];
    over.extend_from_slice(&(MAX_SAFE_LENGTH + 1).to_be_bytes());
    assert!(matches!(
        decode_length(&over),
        Err(EciesError::LengthTooLong { .. })
    ));
}

#[test]
fn test_hostile_prefixes() {
    assert!(matches!(
        decode_length(&[]),
        Err(EciesError::LengthTooShort { .. })
    ));
    assert_eq!(
        decode_length(&[4, 0]).unwrap_err(),
        EciesError::LengthInvalidType(4)
    );
    assert!(matches!(
        decode_length(&[2, 0, 0]),
        Err(EciesError::LengthTooShort { .. })
    ));
    // declares 10 bytes, carries 3
    assert!(matches!(
        decode_length_prefixed(&[0, 10, 1, 2, 3]),
        Err(EciesError::LengthTooShort {
            needed: 10,
            available: 3
        })
    ));
}

#[test]
fn test_prefixed_payload_leaves_remainder() {
    let mut bytes = encode_length_prefixed(b"abc").unwrap();
    bytes.extend_from_slice(b"rest");
    let (payload, consumed) = decode_length_prefixed(&bytes).unwrap();
    assert_eq!(payload, b"abc");
    assert_eq!(&bytes[consumed..], b"rest");
}

#[test]
fn test_header_decoder_is_total() {
    let config = EciesConfig::default();

    // every prefix of a multi header with a bogus count must fail cleanly
    let mut bytes = vec![TYPE_MULTIPLE];
    bytes.extend_from_slice(&[2u8; 33 + 16 + 16]);
    bytes.extend_from_slice(&u16::MAX.to_be_bytes());
    for cut in 0..=bytes.len() {
        assert!(MessageHeader::decode(&bytes[..cut], &config).is_err());
    }

    assert_eq!(
        MessageHeader::decode(&[7, 0, 0], &config).unwrap_err(),
        EciesError::UnsupportedEncryptionType(7)
    );
}

#[test]
fn test_zero_recipient_count_rejected() {
    let config = EciesConfig::default();
    let mut bytes = vec![TYPE_MULTIPLE];
    bytes.extend_from_slice(&[2u8; 33 + 16 + 16]);
    bytes.extend_from_slice(&0u16.to_be_bytes());
    assert!(matches!(
        MessageHeader::decode(&bytes, &config),
        Err(EciesError::MalformedHeader(_))
    ));
}
