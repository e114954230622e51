//! crates/am_io/src/lib.rs
//! I/O crate of the apportionment engine.
//!
//! - `loader`: read a calculation request from a local JSON file (no network).
//! - `canonical_json`: sorted-key compact JSON and atomic writes.
//! - `hasher`: SHA-256 fingerprints over canonical bytes.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for am_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors.
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON (de)serialization errors, with a pointer-like location hint.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    #[error("hash error: {0}")]
    Hash(String),

    /// Request does not describe a computable election.
    #[error("invalid: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json reports line/column, not a pointer.
        IoError::Json {
            pointer: format!("line {} column {}", e.line(), e.column()),
            msg: e.to_string(),
        }
    }
}

impl From<hasher::HashError> for IoError {
    fn from(e: hasher::HashError) -> Self {
        IoError::Hash(e.to_string())
    }
}

pub mod canonical_json;
pub mod hasher;
pub mod loader;

/// Returns true if `s` looks like a URL (any `<scheme>://`, including `file://`).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    s.trim().contains("://")
}

pub mod prelude {
    pub use crate::canonical_json::{to_canonical_bytes, write_canonical_file};
    pub use crate::hasher::{result_id_from_canonical, sha256_canonical, sha256_hex};
    pub use crate::loader::{load_request, CalculationRequest, ElectionRequest};
    pub use crate::{looks_like_url_strict, IoError, IoResult};
}
