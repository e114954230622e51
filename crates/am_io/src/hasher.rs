//! crates/am_io/src/hasher.rs
//!
//! SHA-256 fingerprints of end results.
//! - `sha256_canonical(..)` for values (goes through canonical_json).
//! - `sha256_hex(..)` / `sha256_file(..)` for raw bytes and files.
//! - Hex digests are lowercase.

#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::canonical_json::to_canonical_json_bytes;

#[derive(Error, Debug)]
pub enum HashError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid hex (expected lowercase 64-hex): {0}")]
    InvalidHex(String),
}

/// Validate a lowercase 64-hex digest and shorten it to `n` chars.
pub fn short_hex(hex64: &str, n: usize) -> Result<String, HashError> {
    if hex64.len() != 64 || !hex64.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(HashError::InvalidHex(hex64.to_string()));
    }
    Ok(hex64[..n.min(64)].to_string())
}

/// SHA-256 over the canonical JSON bytes of `value`.
pub fn sha256_canonical<T: Serialize>(value: &T) -> Result<String, HashError> {
    let v = serde_json::to_value(value)?;
    let bytes = to_canonical_json_bytes(&v)?;
    Ok(sha256_hex(&bytes))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over a reader stream (raw, not canonicalized).
pub fn sha256_stream<R: Read>(reader: &mut R) -> Result<String, HashError> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn sha256_file(path: &Path) -> Result<String, HashError> {
    let mut r = BufReader::new(File::open(path)?);
    sha256_stream(&mut r)
}

/// `RES:<hex>`: fingerprint of an end result, stable across reruns.
pub fn result_id_from_canonical<T: Serialize>(value: &T) -> Result<String, HashError> {
    Ok(format!("RES:{}", sha256_canonical(value)?))
}
