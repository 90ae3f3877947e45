//! ECIES Engine Tests
//!
//! End-to-end coverage of the public API: envelopes in every mode,
//! tamper detection, wire framing, configuration and streaming.

mod test_config;
mod test_framing;
mod test_roundtrip;
mod test_streaming;
mod test_tamper;
