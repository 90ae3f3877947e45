// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration building, invariants and the registry

use fabstir_ecies::{
    ConfigRegistry, Ecies, EciesConfig, EciesError, EciesKeyPair, IdProvider,
    IdentifierProvider, Recipient, DEFAULT_CONFIG_KEY,
};
use serde_json::json;

#[test]
fn test_violations_are_aggregated() {
    let err = EciesConfig::build(Some(&json!({
        "curve_name": "p256",
        "symmetric": { "key_size": 16, "key_bits": 128 },
    })))
    .unwrap_err();

    let violations = match err {
        EciesError::InvalidConfiguration { violations } => violations,
        other => panic!("expected InvalidConfiguration, got {:?}", other),
    };
    let names: Vec<&str> = violations.iter().map(|v| v.invariant).collect();
    assert!(names.contains(&"algorithm.curve"), "{:?}", names);
    assert!(names.contains(&"algorithm.key_size"), "{:?}", names);
    // the wrapped-key width depends on the key size as well
    assert!(names.contains(&"frame.encrypted_key_size"), "{:?}", names);
}

#[test]
fn test_overrides_survive_serialization() {
    let config = EciesConfig::build(Some(&json!({ "stream": { "chunk_size": 4096 } }))).unwrap();
    let text = serde_json::to_string(&config).unwrap();
    let back: EciesConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, config);
    assert_eq!(back.stream().chunk_size, 4096);
}

#[test]
fn test_provider_switch_changes_wire_id_width() {
    let config = EciesConfig::for_id_provider(IdProvider::Uuid).unwrap();
    assert_eq!(config.multiple().recipient_id_size, 16);

    let ecies = Ecies::new(std::sync::Arc::new(config));
    let pair = EciesKeyPair::generate();
    let id = ecies.config().id_provider().generate();
    assert_eq!(id.len(), 16);

    let envelope = ecies
        .encrypt_multiple(
            &[Recipient::new(id.clone(), pair.public_key_compressed().to_vec())],
            b"uuid addressed",
        )
        .unwrap();
    assert_eq!(envelope.len(), 68 + 16 + 129 + 14);
    assert_eq!(
        ecies
            .decrypt_multiple(&id, &pair.private_key_bytes()[..], &envelope)
            .unwrap(),
        b"uuid addressed"
    );

    // a default-config engine reads 12-byte IDs and misreads this table
    assert!(Ecies::default()
        .decrypt_multiple(&id[..12], &pair.private_key_bytes()[..], &envelope)
        .is_err());
}

#[test]
fn test_custom_provider_text_roundtrip() {
    let provider = IdProvider::custom(20).unwrap();
    let id = provider.generate();
    assert_eq!(id.len(), 20);
    let text = provider.id_to_string(&id).unwrap();
    assert_eq!(provider.id_from_string(&text).unwrap(), id);

    assert!(matches!(
        IdProvider::custom(0),
        Err(EciesError::InvalidProviderLength(0))
    ));
    assert!(matches!(
        IdProvider::custom(256),
        Err(EciesError::InvalidProviderLength(256))
    ));
}

#[test]
fn test_registry_lifecycle() {
    let registry = ConfigRegistry::new();
    let small = registry
        .register("small-chunks", &json!({ "stream": { "chunk_size": 512 } }))
        .unwrap();
    assert_eq!(small.stream().chunk_size, 512);
    assert!(registry.contains("small-chunks"));

    let derived = registry
        .register_derived(
            "small-uuid",
            "small-chunks",
            &json!({
                "id_provider": "uuid",
                "member_id_length": 16,
                "multiple": { "recipient_id_size": 16 },
            }),
        )
        .unwrap();
    assert_eq!(derived.stream().chunk_size, 512);
    assert_eq!(derived.multiple().recipient_id_size, 16);

    let ecies = Ecies::from_registry(&registry, "small-uuid");
    assert_eq!(ecies.config().id_provider().byte_length(), 16);

    assert_eq!(registry.keys(), vec!["small-chunks", "small-uuid"]);
    assert!(registry.unregister("small-chunks").unwrap());
    assert_eq!(*registry.get("small-chunks"), EciesConfig::default());
}

#[test]
fn test_registry_protects_default() {
    let registry = ConfigRegistry::new();
    assert!(matches!(
        registry.register(DEFAULT_CONFIG_KEY, &json!({})),
        Err(EciesError::ReservedConfigKey(_))
    ));
    assert!(matches!(
        registry.unregister(DEFAULT_CONFIG_KEY),
        Err(EciesError::ReservedConfigKey(_))
    ));

    // a rejected registration leaves nothing behind
    assert!(registry
        .register("broken", &json!({ "iv_size": 12 }))
        .is_err());
    assert!(!registry.contains("broken"));
    assert_eq!(*registry.default_config(), EciesConfig::default());
}
