// crates/suitegen-core/src/hashing.rs
// ============================================================================
// Module: Canonical Hashing
// Description: RFC 8785 canonicalization and SHA-256 digests for cache keys.
// Purpose: Stable keys for batch results and option fingerprints.
// Dependencies: serde, serde_jcs, serde_json, sha2
// ============================================================================

//! ## Overview
//! Batch cache keys and option fingerprints are SHA-256 digests over
//! RFC 8785 (JCS) canonical JSON, so key equality never depends on map order
//! or formatting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use suitegen_config::GenerationOptions;
use suitegen_contract::Operation;

use crate::error::GenerationError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Option fields that never influence generated text.
const NON_OUTPUT_OPTIONS: [&str; 3] = ["output_dir", "concurrency", "recovery"];

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Returns the lowercase hex SHA-256 of a value's canonical JSON.
///
/// # Errors
///
/// Returns [`GenerationError::Generation`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, GenerationError> {
    let bytes = serde_jcs::to_vec(value)
        .map_err(|err| GenerationError::Generation(format!("failed to canonicalize json: {err}")))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex_encode(&hasher.finalize()))
}

/// Returns the cache key of a batch.
///
/// The key covers the sorted `METHOD path` list and the processor fingerprint.
///
/// # Errors
///
/// Returns [`GenerationError::Generation`] when serialization fails.
pub fn batch_cache_key(operations: &[Operation], fingerprint: &str) -> Result<String, GenerationError> {
    let mut keys: Vec<String> = operations.iter().map(Operation::key).collect();
    keys.sort();
    hash_canonical_json(&(keys, fingerprint))
}

/// Returns a digest of the options that shape generated output.
///
/// # Errors
///
/// Returns [`GenerationError::Generation`] when serialization fails.
pub fn options_fingerprint(options: &GenerationOptions) -> Result<String, GenerationError> {
    let mut value = serde_json::to_value(options)
        .map_err(|err| GenerationError::Generation(format!("failed to serialize options: {err}")))?;
    if let Value::Object(map) = &mut value {
        for field in NON_OUTPUT_OPTIONS {
            map.remove(field);
        }
    }
    hash_canonical_json(&value)
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
