// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Single-bit tampering anywhere in an envelope must be rejected

use fabstir_ecies::{
    Ecies, EciesError, EciesKeyPair, EncryptionMode, ErrorKind, IdentifierProvider, Recipient,
};

fn flip(envelope: &[u8], index: usize, bit: u8) -> Vec<u8> {
    let mut tampered = envelope.to_vec();
    tampered[index] ^= 1 << bit;
    tampered
}

#[test]
fn test_simple_envelope_every_byte() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let envelope = ecies
        .encrypt_simple(&pair.public_key_compressed(), b"tamper evident payload")
        .unwrap();

    for index in 0..envelope.len() {
        let tampered = flip(&envelope, index, 0);
        let err = ecies
            .decrypt(&pair.private_key_bytes()[..], None, &tampered)
            .unwrap_err();
        if index == 0 {
            assert!(matches!(err, EciesError::UnsupportedEncryptionType(_)));
        } else {
            assert_eq!(err, EciesError::DecryptionFailed, "byte {}", index);
        }
    }
}

#[test]
fn test_single_envelope_every_byte() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let envelope = ecies
        .encrypt_single(&pair.public_key_compressed(), b"length bound")
        .unwrap();

    for index in 0..envelope.len() {
        for bit in [0, 7] {
            let tampered = flip(&envelope, index, bit);
            let err = ecies
                .decrypt(&pair.private_key_bytes()[..], None, &tampered)
                .unwrap_err();
            if index == 0 {
                assert!(
                    matches!(err, EciesError::UnsupportedEncryptionType(_)),
                    "bit {}: {:?}",
                    bit,
                    err
                );
            } else {
                assert_eq!(
                    err.kind(),
                    ErrorKind::Authentication,
                    "byte {} bit {}: {:?}",
                    index,
                    bit,
                    err
                );
            }
        }
    }
}

#[test]
fn test_single_length_field_mismatch() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let envelope = ecies
        .encrypt_single(&pair.public_key_compressed(), b"twelve bytes")
        .unwrap();

    // low and high bytes of the u64 length field
    for index in [66, 73] {
        let tampered = flip(&envelope, index, 0);
        assert_eq!(
            ecies
                .decrypt(&pair.private_key_bytes()[..], None, &tampered)
                .unwrap_err(),
            EciesError::DecryptionFailed,
            "byte {}",
            index
        );
    }
}

#[test]
fn test_multiple_envelope_every_byte() {
    let ecies = Ecies::default();
    let provider = ecies.config().id_provider();
    let parties: Vec<(EciesKeyPair, Recipient)> = (0..2)
        .map(|_| {
            let pair = EciesKeyPair::generate();
            let recipient =
                Recipient::new(provider.generate(), pair.public_key_compressed().to_vec());
            (pair, recipient)
        })
        .collect();
    let list: Vec<Recipient> = parties.iter().map(|(_, r)| r.clone()).collect();
    let envelope = ecies.encrypt_multiple(&list, b"group message").unwrap();

    let (pair, me) = &parties[0];
    let id_size = provider.byte_length();
    // type | eph | iv | tag | count, then my entry
    let count_range = 66..68;
    let my_id_range = 68..68 + id_size;

    for index in 0..envelope.len() {
        let tampered = flip(&envelope, index, 0);
        let err = ecies
            .decrypt_multiple(&me.id, &pair.private_key_bytes()[..], &tampered)
            .unwrap_err();

        if index == 0 {
            assert!(matches!(err, EciesError::UnsupportedEncryptionType(_)));
        } else if count_range.contains(&index) {
            // count no longer matches the table that follows
            assert!(matches!(err, EciesError::MalformedHeader(_)), "byte {}: {:?}", index, err);
        } else if my_id_range.contains(&index) {
            assert_eq!(err, EciesError::RecipientNotFound, "byte {}", index);
        } else {
            assert_eq!(err, EciesError::DecryptionFailed, "byte {}", index);
        }
    }
}

#[test]
fn test_other_recipients_entry_is_authenticated() {
    let ecies = Ecies::default();
    let provider = ecies.config().id_provider();
    let pairs: Vec<EciesKeyPair> = (0..2).map(|_| EciesKeyPair::generate()).collect();
    let list: Vec<Recipient> = pairs
        .iter()
        .map(|p| Recipient::new(provider.generate(), p.public_key_compressed().to_vec()))
        .collect();
    let envelope = ecies.encrypt_multiple(&list, b"bound header").unwrap();

    // corrupt the second entry's wrapped block; the first recipient must still fail
    let id_size = provider.byte_length();
    let second_wrapped = 68 + (id_size + 129) + id_size + 10;
    let tampered = flip(&envelope, second_wrapped, 3);
    assert_eq!(
        ecies
            .decrypt_multiple(&list[0].id, &pairs[0].private_key_bytes()[..], &tampered)
            .unwrap_err(),
        EciesError::DecryptionFailed
    );
}

#[test]
fn test_truncation_and_extension() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();

    for mode in [EncryptionMode::Simple, EncryptionMode::Single] {
        let recipient = Recipient::new(Vec::new(), pair.public_key_compressed().to_vec());
        let envelope = ecies.encrypt(mode, &[recipient], b"exact").unwrap();

        let mut longer = envelope.clone();
        longer.push(0);
        assert!(ecies.decrypt(&pair.private_key_bytes()[..], None, &longer).is_err());

        for cut in [1, 10, 50, envelope.len() - 1] {
            assert!(ecies
                .decrypt(&pair.private_key_bytes()[..], None, &envelope[..cut])
                .is_err());
        }
    }
}
