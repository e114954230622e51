//! am_core — Core types, canton settings, exact rounding and end-result entities.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! engine (`am_algo`, `am_io`, `am_pipeline`, `am_cli`).
//!
//! - Registry tokens: `ElectionId`, `CandidateId`, `ListId`, `ListUnionId`, …
//! - Canton settings: absolute-majority formula, proportional mandate algorithm
//! - Integer-first numerics: exact `Ratio` and fixed-scale `Decimal` for display
//! - End-result entities mutated by the mandate engines
//! - Deterministic ordering helpers

#![forbid(unsafe_code)]

pub mod entities;
pub mod ids;
pub mod ordering;
pub mod rounding;
pub mod variables;

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum CoreError {
        InvalidToken,
        InvalidRatio,
        DomainOutOfRange(&'static str),
        UnknownCandidate,
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidToken => write!(f, "invalid token"),
                CoreError::InvalidRatio => write!(f, "invalid ratio"),
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
                CoreError::UnknownCandidate => write!(f, "unknown candidate"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub use errors::CoreError;
