//! Tests for session encoding and decoding.
//!
//! These tests cover whole documents: forward references, stale ids,
//! malformed input and full load/save cycles through a backend.

mod roundtrip_tests;
