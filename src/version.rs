// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Fabstir ECIES engine

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-ecies-streaming-2025-10-20";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Major version number
pub const VERSION_MAJOR: u32 = 0;

/// Minor version number
pub const VERSION_MINOR: u32 = 1;

/// Patch version number
pub const VERSION_PATCH: u32 = 0;

/// Build date
pub const BUILD_DATE: &str = "2025-10-20";

/// Envelope wire-format revision; bumped on any incompatible layout change
pub const WIRE_FORMAT_VERSION: u32 = 1;

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "secp256k1",
    "hkdf-sha256",
    "aes-256-gcm",
    "simple-mode",
    "single-mode",
    "multi-recipient",
    "chunked-streaming",
    "stream-progress",
    "stream-cancellation",
    "pluggable-identifiers",
    "config-registry",
    "secure-buffers",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Fabstir ECIES {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for the `version` command
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "wire_format": WIRE_FORMAT_VERSION,
        "features": FEATURES,
        "envelope_types": {
            "simple": crate::frame::TYPE_SIMPLE,
            "single": crate::frame::TYPE_SINGLE,
            "multiple": crate::frame::TYPE_MULTIPLE,
        },
    })
}
