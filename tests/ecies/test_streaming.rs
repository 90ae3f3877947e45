// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Streaming encryption through the engine API

use fabstir_ecies::streaming::FLAG_FINAL;
use fabstir_ecies::{
    Ecies, EciesError, EciesKeyPair, EncryptionMode, IdentifierProvider, Recipient,
    StreamOptions, StreamProgress,
};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// 40 bytes at chunk size 16: header unit, two full units, one 8-byte final unit
const HEADER_UNIT: usize = 2 + 54;
const FULL_UNIT: usize = 4 + 1 + 2 + 16 + 16;
const FINAL_UNIT: usize = 4 + 1 + 2 + 8 + 16;

fn single_recipient(pair: &EciesKeyPair) -> Vec<Recipient> {
    vec![Recipient::new(Vec::new(), pair.public_key_compressed().to_vec())]
}

async fn encrypt(ecies: &Ecies, pair: &EciesKeyPair, data: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut reader = data;
    let mut out = Vec::new();
    ecies
        .encrypt_stream(
            EncryptionMode::Single,
            &single_recipient(pair),
            &mut reader,
            &mut out,
            StreamOptions::default().with_chunk_size(chunk_size),
        )
        .await
        .unwrap();
    out
}

async fn decrypt(ecies: &Ecies, pair: &EciesKeyPair, stream: &[u8]) -> Result<Vec<u8>, EciesError> {
    let mut reader = stream;
    let mut out = Vec::new();
    ecies
        .decrypt_stream(
            &pair.private_key_bytes()[..],
            None,
            &mut reader,
            &mut out,
            StreamOptions::default(),
        )
        .await?;
    Ok(out)
}

fn units(stream: &[u8]) -> (&[u8], &[u8], &[u8], &[u8]) {
    assert_eq!(stream.len(), HEADER_UNIT + 2 * FULL_UNIT + FINAL_UNIT);
    let (header, rest) = stream.split_at(HEADER_UNIT);
    let (first, rest) = rest.split_at(FULL_UNIT);
    let (second, last) = rest.split_at(FULL_UNIT);
    (header, first, second, last)
}

fn renumber(unit: &[u8], seq: u32) -> Vec<u8> {
    let mut unit = unit.to_vec();
    unit[..4].copy_from_slice(&seq.to_be_bytes());
    unit
}

#[tokio::test]
async fn test_stream_matches_buffer_plaintext() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let data: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();

    let stream = encrypt(&ecies, &pair, &data, 4096).await;
    assert_eq!(decrypt(&ecies, &pair, &stream).await.unwrap(), data);

    let envelope = ecies.encrypt_single(&pair.public_key_compressed(), &data).unwrap();
    assert_eq!(
        ecies
            .decrypt_simple_or_single(&pair.private_key_bytes()[..], &envelope)
            .unwrap(),
        data
    );
}

#[tokio::test]
async fn test_fragmented_reads() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let data = vec![0x42u8; 40];
    let stream = encrypt(&ecies, &pair, &data, 16).await;

    // deliver the ciphertext in awkward pieces
    let mut builder = tokio_test::io::Builder::new();
    for piece in stream.chunks(7) {
        builder.read(piece);
    }
    let mut reader = builder.build();

    let mut out = Vec::new();
    let summary = ecies
        .decrypt_stream(
            &pair.private_key_bytes()[..],
            None,
            &mut reader,
            &mut out,
            StreamOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(out, data);
    assert_eq!(summary.chunks, 3);
    assert_eq!(summary.plaintext_bytes, 40);
}

#[tokio::test]
async fn test_reordered_chunks_rejected() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let stream = encrypt(&ecies, &pair, &[9u8; 40], 16).await;
    let (header, first, second, last) = units(&stream);

    let swapped = [header, second, first, last].concat();
    assert_eq!(
        decrypt(&ecies, &pair, &swapped).await.unwrap_err(),
        EciesError::ChunkOutOfSequence {
            expected: 0,
            actual: 1
        }
    );

    // drop a chunk and renumber the rest so the sequence looks intact
    let renumbered = [header.to_vec(), renumber(second, 0), renumber(last, 1)].concat();
    assert_eq!(
        decrypt(&ecies, &pair, &renumbered).await.unwrap_err(),
        EciesError::DecryptionFailed
    );

    let duplicated = [header, first, first, second, last].concat();
    assert!(matches!(
        decrypt(&ecies, &pair, &duplicated).await,
        Err(EciesError::ChunkOutOfSequence { .. })
    ));
}

#[tokio::test]
async fn test_truncation_and_final_flag() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let stream = encrypt(&ecies, &pair, &[5u8; 40], 16).await;
    let (header, first, second, last) = units(&stream);
    assert_eq!(last[4], FLAG_FINAL);
    assert_eq!(first[4], 0);

    let without_final = [header, first, second].concat();
    assert!(matches!(
        decrypt(&ecies, &pair, &without_final).await,
        Err(EciesError::StreamTruncated(_))
    ));

    let cut = &stream[..stream.len() - 3];
    assert!(matches!(
        decrypt(&ecies, &pair, cut).await,
        Err(EciesError::StreamTruncated(_))
    ));

    // promote a middle chunk to final
    let mut early_final = first.to_vec();
    early_final[4] = FLAG_FINAL;
    let promoted = [header, &early_final[..]].concat();
    assert_eq!(
        decrypt(&ecies, &pair, &promoted).await.unwrap_err(),
        EciesError::DecryptionFailed
    );

    // demote the final chunk
    let mut demoted_last = last.to_vec();
    demoted_last[4] = 0;
    let demoted = [header, first, second, &demoted_last[..]].concat();
    assert_eq!(
        decrypt(&ecies, &pair, &demoted).await.unwrap_err(),
        EciesError::DecryptionFailed
    );

    let mut trailing = stream.clone();
    trailing.push(0);
    assert_eq!(
        decrypt(&ecies, &pair, &trailing).await.unwrap_err(),
        EciesError::TrailingData
    );
}

#[tokio::test]
async fn test_header_bound_to_chunks() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let a = encrypt(&ecies, &pair, &[1u8; 40], 16).await;
    let b = encrypt(&ecies, &pair, &[1u8; 40], 16).await;

    let spliced = [&a[..HEADER_UNIT], &b[HEADER_UNIT..]].concat();
    assert_eq!(
        decrypt(&ecies, &pair, &spliced).await.unwrap_err(),
        EciesError::DecryptionFailed
    );

    let wrong_key = EciesKeyPair::generate();
    assert_eq!(
        decrypt(&ecies, &wrong_key, &a).await.unwrap_err(),
        EciesError::DecryptionFailed
    );
}

#[tokio::test]
async fn test_multi_recipient_stream() {
    let ecies = Ecies::default();
    let provider = ecies.config().id_provider();
    let pairs: Vec<EciesKeyPair> = (0..3).map(|_| EciesKeyPair::generate()).collect();
    let recipients: Vec<Recipient> = pairs
        .iter()
        .map(|p| Recipient::new(provider.generate(), p.public_key_compressed().to_vec()))
        .collect();
    let data = vec![0xC3u8; 10_000];

    let mut reader = &data[..];
    let mut stream = Vec::new();
    let summary = ecies
        .encrypt_stream(
            EncryptionMode::Multiple,
            &recipients,
            &mut reader,
            &mut stream,
            StreamOptions::default().with_chunk_size(1000),
        )
        .await
        .unwrap();
    assert_eq!(summary.chunks, 10);

    for (pair, recipient) in pairs.iter().zip(&recipients) {
        let mut reader = &stream[..];
        let mut out = Vec::new();
        ecies
            .decrypt_stream(
                &pair.private_key_bytes()[..],
                Some(recipient.id.as_slice()),
                &mut reader,
                &mut out,
                StreamOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(out, data);
    }

    let outsider = EciesKeyPair::generate();
    let mut reader = &stream[..];
    let mut out = Vec::new();
    let err = ecies
        .decrypt_stream(
            &outsider.private_key_bytes()[..],
            Some(provider.generate().as_slice()),
            &mut reader,
            &mut out,
            StreamOptions::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, EciesError::RecipientNotFound);
    assert!(out.is_empty());

    let mut reader = &stream[..];
    let err = ecies
        .decrypt_stream(
            &pairs[0].private_key_bytes()[..],
            None,
            &mut reader,
            &mut Vec::<u8>::new(),
            StreamOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EciesError::InvalidIdentifier(_)));
}

#[tokio::test]
async fn test_progress_reports_every_chunk() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let data = vec![7u8; 10 * 512];
    let (tx, mut rx) = mpsc::channel::<StreamProgress>(64);

    let mut reader = &data[..];
    let mut out = Vec::new();
    ecies
        .encrypt_stream(
            EncryptionMode::Single,
            &single_recipient(&pair),
            &mut reader,
            &mut out,
            StreamOptions::default()
                .with_chunk_size(512)
                .with_total_bytes(data.len() as u64)
                .with_progress(tx),
        )
        .await
        .unwrap();

    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    assert_eq!(updates.len(), 10);
    for (i, update) in updates.iter().enumerate() {
        assert_eq!(update.chunks_processed, i as u64 + 1);
        assert_eq!(update.bytes_processed, (i as u64 + 1) * 512);
        assert_eq!(update.total_bytes, Some(data.len() as u64));
    }
    assert_eq!(updates.last().unwrap().percent, Some(100.0));
}

#[tokio::test]
async fn test_full_progress_channel_does_not_stall() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let data = vec![1u8; 64 * 100];
    // never drained
    let (tx, _rx) = mpsc::channel::<StreamProgress>(1);

    let mut reader = &data[..];
    let mut out = Vec::new();
    let summary = ecies
        .encrypt_stream(
            EncryptionMode::Simple,
            &single_recipient(&pair),
            &mut reader,
            &mut out,
            StreamOptions::default()
                .with_chunk_size(64)
                .with_progress(tx),
        )
        .await
        .unwrap();
    assert_eq!(summary.chunks, 100);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let token = CancellationToken::new();
    token.cancel();

    let data = vec![0u8; 100];
    let mut reader = &data[..];
    let mut out = Vec::new();
    let err = ecies
        .encrypt_stream(
            EncryptionMode::Single,
            &single_recipient(&pair),
            &mut reader,
            &mut out,
            StreamOptions::default().with_cancellation(token.clone()),
        )
        .await
        .unwrap_err();
    assert_eq!(err, EciesError::Cancelled);

    let stream = encrypt(&ecies, &pair, &data, 16).await;
    let mut reader = &stream[..];
    let mut plain = Vec::new();
    let err = ecies
        .decrypt_stream(
            &pair.private_key_bytes()[..],
            None,
            &mut reader,
            &mut plain,
            StreamOptions::default().with_cancellation(token),
        )
        .await
        .unwrap_err();
    assert_eq!(err, EciesError::Cancelled);
    assert!(plain.is_empty());
}

/// Reader that cancels a token once it has handed out `after` bytes
struct CancellingReader<'a> {
    data: &'a [u8],
    served: usize,
    after: usize,
    token: CancellationToken,
}

impl AsyncRead for CancellingReader<'_> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let n = buf.remaining().min(self.data.len()).min(16);
        let data = self.data;
        let (head, tail) = data.split_at(n);
        buf.put_slice(head);
        self.data = tail;
        self.served += n;
        if self.served >= self.after {
            self.token.cancel();
        }
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_cancelled_mid_stream_keeps_verified_prefix() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let data: Vec<u8> = (0..1600u32).map(|i| i as u8).collect();
    let stream = encrypt(&ecies, &pair, &data, 16).await;

    let token = CancellationToken::new();
    let mut reader = CancellingReader {
        data: &stream,
        served: 0,
        after: HEADER_UNIT + 3 * FULL_UNIT,
        token: token.clone(),
    };
    let mut out = Vec::new();
    let err = ecies
        .decrypt_stream(
            &pair.private_key_bytes()[..],
            None,
            &mut reader,
            &mut out,
            StreamOptions::default().with_cancellation(token),
        )
        .await
        .unwrap_err();

    assert_eq!(err, EciesError::Cancelled);
    assert!(!out.is_empty());
    assert!(out.len() < data.len());
    assert_eq!(out.len() % 16, 0);
    assert_eq!(&out[..], &data[..out.len()]);
}

#[tokio::test]
async fn test_withheld_output_released_only_on_success() {
    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();
    let data = vec![0x17u8; 40];
    let stream = encrypt(&ecies, &pair, &data, 16).await;

    // corrupt the ciphertext of the final chunk
    let mut tampered = stream.clone();
    let last = tampered.len() - 1;
    tampered[last] ^= 0x01;

    for (withhold, expected_len) in [(false, 32), (true, 0)] {
        let options = if withhold {
            StreamOptions::default().withhold_output()
        } else {
            StreamOptions::default()
        };
        let mut reader = &tampered[..];
        let mut out = Vec::new();
        let err = ecies
            .decrypt_stream(&pair.private_key_bytes()[..], None, &mut reader, &mut out, options)
            .await
            .unwrap_err();
        assert_eq!(err, EciesError::DecryptionFailed);
        assert_eq!(out.len(), expected_len, "withhold = {}", withhold);
    }

    let mut reader = &stream[..];
    let mut out = Vec::new();
    let summary = ecies
        .decrypt_stream(
            &pair.private_key_bytes()[..],
            None,
            &mut reader,
            &mut out,
            StreamOptions::default().withhold_output(),
        )
        .await
        .unwrap();
    assert_eq!(out, data);
    assert_eq!(summary.chunks, 3);
}

#[tokio::test]
async fn test_file_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let plain_path = dir.path().join("large.bin");
    let enc_path = dir.path().join("large.ecies");
    let dec_path = dir.path().join("large.out");

    let data: Vec<u8> = (0..(3 * 1024 * 1024 + 17u32)).map(|i| (i * 31) as u8).collect();
    tokio::fs::write(&plain_path, &data).await.unwrap();

    let ecies = Ecies::default();
    let pair = EciesKeyPair::generate();

    let mut input = tokio::fs::File::open(&plain_path).await.unwrap();
    let mut output = tokio::fs::File::create(&enc_path).await.unwrap();
    let summary = ecies
        .encrypt_stream(
            EncryptionMode::Single,
            &single_recipient(&pair),
            &mut input,
            &mut output,
            StreamOptions::default(),
        )
        .await
        .unwrap();
    // default 1 MiB chunks
    assert_eq!(summary.chunks, 4);
    drop(output);

    let mut input = tokio::fs::File::open(&enc_path).await.unwrap();
    let mut output = tokio::fs::File::create(&dec_path).await.unwrap();
    ecies
        .decrypt_stream(
            &pair.private_key_bytes()[..],
            None,
            &mut input,
            &mut output,
            StreamOptions::default(),
        )
        .await
        .unwrap();
    drop(output);

    assert_eq!(tokio::fs::read(&dec_path).await.unwrap(), data);
}
