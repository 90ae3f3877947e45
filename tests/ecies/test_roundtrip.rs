// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Buffer-mode round trips through the public API

use fabstir_ecies::{
    Ecies, EciesError, EciesKeyPair, EncryptionMode, IdentifierProvider, Recipient,
};

fn party(ecies: &Ecies) -> (EciesKeyPair, Recipient) {
    let pair = ecies.generate_key_pair();
    let recipient = Recipient::new(
        ecies.config().id_provider().generate(),
        pair.public_key_compressed().to_vec(),
    );
    (pair, recipient)
}

#[test]
fn test_every_mode_roundtrips() {
    let ecies = Ecies::default();
    let (pair, recipient) = party(&ecies);
    let private_key = pair.private_key_bytes();

    for mode in [
        EncryptionMode::Simple,
        EncryptionMode::Single,
        EncryptionMode::Multiple,
    ] {
        for plaintext in [&b""[..], b"x", &[0xA5u8; 4096][..]] {
            let envelope = ecies
                .encrypt(mode, std::slice::from_ref(&recipient), plaintext)
                .unwrap();
            assert_eq!(envelope[0], mode.tag());
            assert_eq!(
                envelope.len(),
                ecies
                    .compute_encrypted_length(mode, plaintext.len(), 1)
                    .unwrap()
            );

            let id = (mode == EncryptionMode::Multiple).then_some(recipient.id.as_slice());
            let decrypted = ecies.decrypt(&private_key[..], id, &envelope).unwrap();
            assert_eq!(decrypted, plaintext, "mode {}", mode);
        }
    }
}

#[test]
fn test_simple_and_single_overheads() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();

    let simple = ecies.encrypt_simple(&pair.public_key_compressed(), b"hello").unwrap();
    assert_eq!(simple.len(), 66 + 5);

    let single = ecies.encrypt_single(&pair.public_key_compressed(), b"hello").unwrap();
    assert_eq!(single.len(), 74 + 5);
    assert_eq!(&single[66..74], &5u64.to_be_bytes());
}

#[test]
fn test_all_public_key_encodings_accepted() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let uncompressed = pair.public_key_uncompressed();

    for key in [
        pair.public_key_compressed().to_vec(),
        uncompressed.to_vec(),
        uncompressed[1..].to_vec(),
    ] {
        let envelope = ecies.encrypt_single(&key, b"encoding").unwrap();
        let plain = ecies
            .decrypt_simple_or_single(&pair.private_key_bytes()[..], &envelope)
            .unwrap();
        assert_eq!(plain, b"encoding");
    }
}

#[test]
fn test_fresh_randomness_per_message() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let a = ecies.encrypt_simple(&pair.public_key_compressed(), b"same").unwrap();
    let b = ecies.encrypt_simple(&pair.public_key_compressed(), b"same").unwrap();
    assert_ne!(a, b);
    // ephemeral keys differ
    assert_ne!(&a[1..34], &b[1..34]);
}

#[test]
fn test_recipients_are_isolated() {
    let ecies = Ecies::default();
    let parties: Vec<_> = (0..4).map(|_| party(&ecies)).collect();
    let addressed: Vec<Recipient> = parties[..3].iter().map(|(_, r)| r.clone()).collect();

    let envelope = ecies.encrypt_multiple(&addressed, b"members only").unwrap();

    for (pair, recipient) in &parties[..3] {
        let plain = ecies
            .decrypt_multiple(&recipient.id, &pair.private_key_bytes()[..], &envelope)
            .unwrap();
        assert_eq!(plain, b"members only");
    }

    // outsider: not listed
    let (outsider, outsider_recipient) = &parties[3];
    assert_eq!(
        ecies
            .decrypt_multiple(&outsider_recipient.id, &outsider.private_key_bytes()[..], &envelope)
            .unwrap_err(),
        EciesError::RecipientNotFound
    );

    // outsider claiming a member's ID
    assert_eq!(
        ecies
            .decrypt_multiple(&parties[0].1.id, &outsider.private_key_bytes()[..], &envelope)
            .unwrap_err(),
        EciesError::DecryptionFailed
    );
}

#[test]
fn test_wrong_private_key_is_opaque() {
    let ecies = Ecies::default();
    let alice = EciesKeyPair::generate();
    let mallory = EciesKeyPair::generate();

    for mode in [EncryptionMode::Simple, EncryptionMode::Single] {
        let recipient = Recipient::new(Vec::new(), alice.public_key_compressed().to_vec());
        let envelope = ecies.encrypt(mode, &[recipient], b"secret").unwrap();
        assert_eq!(
            ecies
                .decrypt(&mallory.private_key_bytes()[..], None, &envelope)
                .unwrap_err(),
            EciesError::DecryptionFailed
        );
    }
}

#[test]
fn test_dispatch_argument_errors() {
    let ecies = Ecies::default();
    let (pair, recipient) = party(&ecies);

    assert_eq!(
        ecies.encrypt(EncryptionMode::Single, &[], b"x").unwrap_err(),
        EciesError::NoRecipients
    );
    assert!(matches!(
        ecies.encrypt(
            EncryptionMode::Simple,
            &[recipient.clone(), party(&ecies).1],
            b"x"
        ),
        Err(EciesError::TooManyRecipients { .. })
    ));

    let envelope = ecies
        .encrypt(EncryptionMode::Multiple, &[recipient], b"x")
        .unwrap();
    assert!(matches!(
        ecies.decrypt(&pair.private_key_bytes()[..], None, &envelope),
        Err(EciesError::InvalidIdentifier(_))
    ));
    assert!(matches!(
        ecies.decrypt(&pair.private_key_bytes()[..], None, &[]),
        Err(EciesError::MalformedHeader(_))
    ));
}

#[test]
fn test_parse_header_without_decrypting() {
    let ecies = Ecies::default();
    let parties: Vec<_> = (0..2).map(|_| party(&ecies)).collect();
    let list: Vec<Recipient> = parties.iter().map(|(_, r)| r.clone()).collect();
    let envelope = ecies.encrypt_multiple(&list, b"peek").unwrap();

    let header = ecies.parse_header(&envelope).unwrap();
    assert_eq!(header.mode(), EncryptionMode::Multiple);
    assert_eq!(header.recipients().len(), 2);
    assert!(header.find_recipient(&list[1].id).is_some());
    assert_eq!(
        header.encoded_len(ecies.config()),
        envelope.len() - b"peek".len()
    );
}

#[test]
fn test_invalid_private_key_rejected() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let envelope = ecies.encrypt_simple(&pair.public_key_compressed(), b"x").unwrap();

    assert!(matches!(
        ecies.decrypt_simple_or_single(&[0u8; 32], &envelope),
        Err(EciesError::InvalidKey { .. })
    ));
    assert!(matches!(
        ecies.decrypt_simple_or_single(&[1u8; 31], &envelope),
        Err(EciesError::InvalidKey { .. })
    ));
}
